use thiserror::Error;

/// Fatal conversion failures. Anything recoverable goes to `Diagnostics` instead.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("node '{node}' has no '{property}' property")]
    MissingProperty { node: String, property: String },

    #[error("property '{property}' of node '{node}' is not {expected}")]
    WrongKind {
        node: String,
        property: String,
        expected: &'static str,
    },

    #[error("property '{property}' of node '{node}' has {len} values, not a multiple of {stride}")]
    BadStride {
        node: String,
        property: String,
        stride: usize,
        len: usize,
    },

    #[error("node '{node}': {what} index {index} is out of range (len {len})")]
    IndexOutOfRange {
        node: String,
        what: &'static str,
        index: i64,
        len: usize,
    },

    #[error("object does not contain bones")]
    NoSkeleton,

    #[error("mesh '{mesh}' is skinned to bone '{bone}' which is not part of the skeleton")]
    UnknownSkinBone { mesh: String, bone: String },

    #[error("world transform of bone '{bone}' cannot be inverted")]
    SingularTransform { bone: String },

    #[error("animation channel '{channel}' ran out of samples at sample {sample} (bone '{bone}')")]
    SampleBufferExhausted {
        channel: char,
        bone: String,
        sample: usize,
    },
}

pub type Result<T> = std::result::Result<T, ConvertError>;
