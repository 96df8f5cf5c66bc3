//! SID register map.
//!
//! # Register Layout
//!
//! - 0x00-0x06: Voice 1 (freq lo/hi, pulse width lo/hi, control, AD, SR)
//! - 0x07-0x0D: Voice 2, same layout
//! - 0x0E-0x14: Voice 3, same layout
//! - 0x15-0x16: Filter cutoff (lo: bits 0-2, hi: bits 3-10)
//! - 0x17: Resonance (bits 4-7) and filter routing (ext, v3, v2, v1)
//! - 0x18: Mode/volume: voice 3 off (bit 7), HP/BP/LP (bits 4-6), volume (bits 0-3)
//! - 0x19-0x1A: Paddle X/Y (read only)
//! - 0x1B: Voice 3 oscillator output (read only)
//! - 0x1C: Voice 3 envelope output (read only)
//! - 0x1D-0x1F: unused

/// Number of addressable registers per chip.
pub const REGISTER_COUNT: usize = 32;

/// Mask applied to every incoming register address.
pub const REGISTER_MASK: u8 = 0x1F;

/// Registers per voice.
pub const VOICE_STRIDE: u8 = 7;

/// Number of voices per chip.
pub const VOICE_COUNT: u8 = 3;

pub const FC_LO: u8 = 0x15;
pub const FC_HI: u8 = 0x16;
pub const RES_FILT: u8 = 0x17;
pub const MODE_VOL: u8 = 0x18;
pub const POT_X: u8 = 0x19;
pub const POT_Y: u8 = 0x1A;
pub const OSC3: u8 = 0x1B;
pub const ENV3: u8 = 0x1C;

/// Bits of `MODE_VOL` kept when filtering is disabled (voice 3 off + volume).
pub const MODE_NO_FILTER_MASK: u8 = 0x8F;

/// How the recorder treats a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterClass {
    /// Register of voice 0, 1 or 2.
    Voice(u8),
    /// Cutoff and resonance/routing (0x15-0x17).
    Filter,
    /// Mode and master volume (0x18).
    ModeVolume,
    /// Paddles, voice 3 outputs and unused slots.
    ReadOnly,
}

/// Classify a register address (masked to 5 bits).
pub fn classify(register: u8) -> RegisterClass {
    match register & REGISTER_MASK {
        r @ 0x00..=0x14 => RegisterClass::Voice(r / VOICE_STRIDE),
        FC_LO..=RES_FILT => RegisterClass::Filter,
        MODE_VOL => RegisterClass::ModeVolume,
        _ => RegisterClass::ReadOnly,
    }
}

/// Registers whose reads are logged as observed values.
pub fn is_observed_read(register: u8) -> bool {
    matches!(register & REGISTER_MASK, OSC3 | ENV3)
}

/// Short register name, e.g. `V2_CTRL` or `MODE_VOL`.
pub fn register_name(register: u8) -> &'static str {
    const VOICE: [[&str; 7]; 3] = [
        [
            "V1_FREQ_LO",
            "V1_FREQ_HI",
            "V1_PW_LO",
            "V1_PW_HI",
            "V1_CTRL",
            "V1_AD",
            "V1_SR",
        ],
        [
            "V2_FREQ_LO",
            "V2_FREQ_HI",
            "V2_PW_LO",
            "V2_PW_HI",
            "V2_CTRL",
            "V2_AD",
            "V2_SR",
        ],
        [
            "V3_FREQ_LO",
            "V3_FREQ_HI",
            "V3_PW_LO",
            "V3_PW_HI",
            "V3_CTRL",
            "V3_AD",
            "V3_SR",
        ],
    ];

    let register = register & REGISTER_MASK;
    match register {
        0x00..=0x14 => {
            VOICE[(register / VOICE_STRIDE) as usize][(register % VOICE_STRIDE) as usize]
        }
        FC_LO => "FC_LO",
        FC_HI => "FC_HI",
        RES_FILT => "RES_FILT",
        MODE_VOL => "MODE_VOL",
        POT_X => "POT_X",
        POT_Y => "POT_Y",
        OSC3 => "OSC3",
        ENV3 => "ENV3",
        _ => "UNUSED",
    }
}
