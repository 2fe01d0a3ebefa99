/// Fatal problems with a pulse's data header (the channel schema).
///
/// The pulse is dropped and the cached schema is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The pulse header announced a new hash but no data header frame followed.
    #[error("data header frame missing for hash {hash}")]
    MissingDataHeader { hash: String },

    /// The data header is not valid JSON or does not match the expected layout.
    #[error("data header is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A channel declares a compression this codec does not provide.
    #[error("unknown compression '{compression}' on channel '{channel}'")]
    UnknownCompression {
        channel: String,
        compression: String,
    },

    /// The pulse header declares an unknown data header compression.
    #[error("unknown data header compression '{0}'")]
    UnknownHeaderCompression(String),

    /// The compressed data header could not be unpacked.
    #[error("data header decompression failed: {0}")]
    Decompress(#[source] ChannelError),

    /// Two channels share one name.
    #[error("duplicate channel name '{0}' in data header")]
    DuplicateChannel(String),
}

/// Per-channel decode failures.
///
/// These never leave the decoder: the channel value becomes absent and the
/// rest of the pulse is decoded normally.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The payload does not hold a whole number of elements.
    #[error("payload length {len} is not a multiple of element width {width}")]
    Length { len: usize, width: usize },

    /// The element count does not match the declared shape.
    #[error("declared shape {shape:?} expects {expected} elements, payload holds {actual}")]
    Shape {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    /// A compressed payload ended early or carries trailing bytes.
    #[error("compressed payload malformed: {0}")]
    Truncated(&'static str),

    /// The embedded block size cannot be used for this element width.
    #[error("block size of {bytes} bytes is invalid for element width {width}")]
    BlockSize { bytes: usize, width: usize },

    /// An LZ4 block failed to decompress.
    #[error("lz4 block decompression failed: {0}")]
    Lz4(#[from] lz4_flex::block::DecompressError),

    /// A decompressed block has the wrong size.
    #[error("lz4 block decompressed to {actual} bytes, expected {expected}")]
    BlockLength { expected: usize, actual: usize },

    /// A text channel carries bytes that are not UTF-8.
    #[error("text payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Errors that abort decoding of a single pulse.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The pulse header frame is not valid JSON.
    #[error("pulse header is not valid JSON: {0}")]
    Header(#[source] serde_json::Error),

    /// The data header could not be resolved.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Producer-side misconfiguration. Always reported immediately.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The compression id is not one this codec provides.
    #[error("unknown compression '{0}'")]
    UnknownCompression(String),

    /// The array shape does not match the number of elements.
    #[error("array shape {shape:?} holds {expected} elements, data has {actual}")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    /// Rows of a nested array differ in length.
    #[error("ragged array: row {row} has {actual} elements, expected {expected}")]
    RaggedArray {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Channel names must not be empty.
    #[error("channel name must not be empty")]
    EmptyChannelName,

    /// A channel with this name is already registered.
    #[error("channel '{0}' is already registered")]
    DuplicateChannel(String),

    /// A channel value could not be packed.
    #[error("failed to pack channel '{channel}': {source}")]
    Pack {
        channel: String,
        #[source]
        source: ChannelError,
    },

    /// The data header could not be compressed.
    #[error("failed to compress data header: {0}")]
    HeaderCompression(#[source] ChannelError),

    /// Header serialization failed.
    #[error("failed to serialize header: {0}")]
    Json(#[from] serde_json::Error),
}
