use crate::constant::SqlType;

/// Column and parameter types of the Informix wire protocol
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InformixDataType {
    Char = 0x0000,
    Integer = 0x0002,
    Serial = 0x0006,
    VarChar = 0x000D,
}

impl InformixDataType {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0000 => Some(Self::Char),
            0x0002 => Some(Self::Integer),
            0x0006 => Some(Self::Serial),
            0x000D => Some(Self::VarChar),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn sql_type(self) -> SqlType {
        match self {
            Self::Char => SqlType::Char,
            Self::Integer | Self::Serial => SqlType::Integer,
            Self::VarChar => SqlType::VarChar,
        }
    }

    /// Whether every value takes the same number of row bytes
    pub fn is_constant_length(self) -> bool {
        !matches!(self, Self::VarChar)
    }

    /// Length bytes a row carries in front of the value
    pub fn response_length_bytes(self) -> usize {
        match self {
            Self::VarChar => 1,
            Self::Char | Self::Integer | Self::Serial => 0,
        }
    }

    /// Length bytes written in front of a parameter value
    pub fn update_length_bytes(self) -> usize {
        match self {
            Self::Char => 2,
            Self::VarChar => 1,
            Self::Integer | Self::Serial => 0,
        }
    }

    pub fn is_string(self) -> bool {
        matches!(self, Self::Char | Self::VarChar)
    }

    /// Row bytes a value of declared `length` can take
    pub fn row_bytes(self, length: u32) -> usize {
        match self {
            Self::Integer | Self::Serial => 4,
            Self::Char | Self::VarChar => length as usize + self.response_length_bytes(),
        }
    }
}
