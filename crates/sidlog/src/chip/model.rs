//! Chip model and sampling configuration.
use std::convert::TryFrom;

use crate::error::ChipError;

/// Host identifier of the MOS 6581.
pub const MODEL_ID_MOS6581: u32 = 0;
/// Host identifier of the MOS 8580.
pub const MODEL_ID_MOS8580: u32 = 1;

/// PAL C64 system clock in Hz.
pub const CLOCK_PAL: f32 = 985_248.0;
/// NTSC C64 system clock in Hz.
pub const CLOCK_NTSC: f32 = 1_022_727.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SidModel {
    Mos6581,
    Mos8580,
}

impl SidModel {
    /// Code written into init records (`0x6581` / `0x8580`).
    pub fn code(self) -> u16 {
        match self {
            SidModel::Mos6581 => 0x6581,
            SidModel::Mos8580 => 0x8580,
        }
    }

    /// Host identifier of this model.
    pub fn id(self) -> u32 {
        match self {
            SidModel::Mos6581 => MODEL_ID_MOS6581,
            SidModel::Mos8580 => MODEL_ID_MOS8580,
        }
    }
}

impl TryFrom<u32> for SidModel {
    type Error = ChipError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            MODEL_ID_MOS6581 => Ok(SidModel::Mos6581),
            MODEL_ID_MOS8580 => Ok(SidModel::Mos8580),
            other => Err(ChipError::InvalidModel(other)),
        }
    }
}

/// Resampling method requested by the host. Recorded, not used for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingMethod {
    #[default]
    Interpolate,
    ResampleInterpolate,
}

/// Sampling configuration forwarded by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    /// Chip clock in Hz. Written into init records.
    pub clock_frequency: f32,
    pub sample_rate: f32,
    pub method: SamplingMethod,
    pub fast: bool,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            clock_frequency: CLOCK_PAL,
            sample_rate: 44_100.0,
            method: SamplingMethod::Interpolate,
            fast: true,
        }
    }
}

/// Defaults applied to every chip a session creates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChipConfig {
    /// Raw host model identifier, see [`SidModel`].
    pub model: u32,
    pub digiboost: bool,
    pub filter: bool,
    pub sampling: SamplingParams,
}

impl Default for ChipConfig {
    fn default() -> Self {
        Self {
            model: MODEL_ID_MOS6581,
            digiboost: false,
            filter: true,
            sampling: SamplingParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_from_id() {
        assert_eq!(SidModel::try_from(0), Ok(SidModel::Mos6581));
        assert_eq!(SidModel::try_from(1), Ok(SidModel::Mos8580));
        assert_eq!(SidModel::try_from(2), Err(ChipError::InvalidModel(2)));
    }

    #[test]
    fn test_model_code() {
        assert_eq!(SidModel::Mos6581.code(), 0x6581);
        assert_eq!(SidModel::Mos8580.code(), 0x8580);
        assert_eq!(SidModel::Mos8580.id(), MODEL_ID_MOS8580);
    }
}
