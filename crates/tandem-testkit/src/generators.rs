//! Proptest generators for property-based testing.

use proptest::prelude::*;

use tandem_core::{Document, Op, OpKind};
use tandem_net::Frame;

/// Generate an OpKind.
pub fn op_kind() -> impl Strategy<Value = OpKind> {
    prop_oneof![
        Just(OpKind::Insert),
        Just(OpKind::Erase),
        Just(OpKind::Replace),
    ]
}

/// Generate op text of at most `max_len` bytes, including delimiters and
/// line breaks.
pub fn text(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![
            4 => any::<u8>(),
            1 => Just(b'|'),
            1 => Just(b'\n'),
            1 => Just(b'\\'),
        ],
        0..=max_len,
    )
}

/// Generate a frame with an arbitrary kind and a small payload.
pub fn frame() -> impl Strategy<Value = Frame> {
    (any::<u8>(), prop::collection::vec(any::<u8>(), 0..512))
        .prop_map(|(kind, payload)| Frame::new(kind, payload))
}

/// One step of an edit script.
///
/// Positions and lengths are seeds; [`EditStep::to_op`] scales them into
/// the bounds of whatever document the step is applied to, so every
/// script is valid.
#[derive(Debug, Clone)]
pub struct EditStep {
    pub kind: OpKind,
    pub pos_seed: u32,
    pub len_seed: u32,
    pub text: Vec<u8>,
}

impl EditStep {
    /// Build an in-bounds op for a document of `doc_len` bytes.
    pub fn to_op(&self, doc_len: usize) -> Op {
        let doc_len = doc_len as u32;
        // Erase and replace need at least one byte to act on; fall back to
        // an insert on an empty document.
        let kind = if doc_len == 0 { OpKind::Insert } else { self.kind };
        match kind {
            OpKind::Insert => Op::insert(self.pos_seed % (doc_len + 1), self.text.clone()),
            OpKind::Erase | OpKind::Replace => {
                let pos = self.pos_seed % doc_len;
                let len = self.len_seed % (doc_len - pos + 1);
                if kind == OpKind::Erase {
                    Op::erase(pos, len)
                } else {
                    Op::replace(pos, len, self.text.clone())
                }
            }
        }
    }
}

impl Arbitrary for EditStep {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (op_kind(), any::<u32>(), 0u32..8, text(16))
            .prop_map(|(kind, pos_seed, len_seed, text)| EditStep {
                kind,
                pos_seed,
                len_seed,
                text,
            })
            .boxed()
    }
}

/// Generate a script of up to `max_steps` steps.
pub fn edit_script(max_steps: usize) -> impl Strategy<Value = Vec<EditStep>> {
    prop::collection::vec(any::<EditStep>(), 0..=max_steps)
}

/// Run a script against a fresh document, returning it and the stamped ops.
pub fn run_script(script: &[EditStep]) -> (Document, Vec<Op>) {
    let mut doc = Document::new();
    let mut ops = Vec::with_capacity(script.len());
    for step in script {
        let op = step.to_op(doc.len());
        match doc.apply(&op) {
            Ok(stamped) => ops.push(stamped),
            Err(e) => panic!("script step {step:?} rejected: {e}"),
        }
    }
    (doc, ops)
}
