/// Database-independent SQL type of a result column
///
/// Vendor data types map onto one of these; typed getters check against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Double,
    Decimal,
    Char,
    VarChar,
    LongVarChar,
    NChar,
    NVarChar,
    LongNVarChar,
    Binary,
    VarBinary,
    Blob,
    Date,
    Time,
    Timestamp,
}

impl SqlType {
    /// Whether a string getter may read a column of this type
    pub fn is_string(self) -> bool {
        matches!(
            self,
            SqlType::Char
                | SqlType::VarChar
                | SqlType::LongVarChar
                | SqlType::NChar
                | SqlType::NVarChar
                | SqlType::LongNVarChar
        )
    }

    pub fn is_binary(self) -> bool {
        matches!(self, SqlType::Binary | SqlType::VarBinary | SqlType::Blob)
    }
}

/// Row buffer budget for a connection-attached result set (10 MiB)
pub const MAX_ROW_BUFFER_BYTES: usize = 10 * 1024 * 1024;

/// Lower bound of the chunk size used when materializing rows
pub const MIN_BUFFERED_CHUNK_BYTES: usize = 10 * 1024;

/// Largest parameter count whose containers are pooled
pub const MAX_POOLED_PARAMETERS: usize = 30;
