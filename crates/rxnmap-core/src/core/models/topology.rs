use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
}

impl BondOrder {
    /// Numeric order used in bond-electron matrices.
    ///
    /// Aromatic bonds have no integral order here and count as single bonds.
    pub fn electron_matrix_value(self) -> f64 {
        match self {
            Self::Quadruple => 4.0,
            Self::Triple => 3.0,
            Self::Double => 2.0,
            Self::Single | Self::Aromatic => 1.0,
        }
    }

    /// Bond order as written in the MDL bond block (aromatic = 4).
    pub fn mdl_code(self) -> u8 {
        match self {
            Self::Single | Self::Quadruple => 1,
            Self::Double => 2,
            Self::Triple => 3,
            Self::Aromatic => 4,
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid bond order string")]
pub struct ParseBondOrderError;

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            "4" | "q" | "quadruple" => Ok(Self::Quadruple),
            "ar" | "aromatic" => Ok(Self::Aromatic),
            _ => Err(ParseBondOrderError),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Single => "Single",
                Self::Double => "Double",
                Self::Triple => "Triple",
                Self::Quadruple => "Quadruple",
                Self::Aromatic => "Aromatic",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondStereo {
    #[default]
    None,
    Up,
    Down,
    UpOrDown,
    EOrZ,
}

impl BondStereo {
    pub const NONE_CODE: i32 = 0;
    pub const UP_CODE: i32 = 1;
    pub const E_OR_Z_CODE: i32 = 3;
    pub const UP_OR_DOWN_CODE: i32 = 4;
    pub const DOWN_CODE: i32 = 6;

    /// Integer stereo code shared by bond-electron matrices and MDL bond blocks.
    pub fn code(self) -> i32 {
        match self {
            Self::None => Self::NONE_CODE,
            Self::Up => Self::UP_CODE,
            Self::Down => Self::DOWN_CODE,
            Self::UpOrDown => Self::UP_OR_DOWN_CODE,
            Self::EOrZ => Self::E_OR_Z_CODE,
        }
    }
}

impl fmt::Display for BondStereo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::None => "none",
                Self::Up => "up",
                Self::Down => "down",
                Self::UpOrDown => "up-or-down",
                Self::EOrZ => "e-or-z",
            }
        )
    }
}

#[derive(Debug, Error)]
#[error("Invalid bond stereo string")]
pub struct ParseBondStereoError;

impl FromStr for BondStereo {
    type Err = ParseBondStereoError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "up" | "wedge" => Ok(Self::Up),
            "down" | "hash" => Ok(Self::Down),
            "up-or-down" | "either" => Ok(Self::UpOrDown),
            "e-or-z" | "crossed" => Ok(Self::EOrZ),
            _ => Err(ParseBondStereoError),
        }
    }
}

/// Bond payload stored on a molecule graph edge. Endpoints live on the edge itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bond {
    pub order: BondOrder,
    pub stereo: BondStereo,
}

impl Bond {
    pub fn new(order: BondOrder) -> Self {
        Self {
            order,
            stereo: BondStereo::None,
        }
    }

    pub fn with_stereo(mut self, stereo: BondStereo) -> Self {
        self.stereo = stereo;
        self
    }
}
