// Ring membership
pub const MAINLINE_MOVEMENTS: [u8; 4] = [1, 2, 5, 6];
pub const SECONDARY_MOVEMENTS: [u8; 4] = [3, 4, 7, 8];

// Halves of each ring that may run concurrently with the other half
pub const PRIMARY_HALF: [u8; 4] = [1, 2, 3, 4];
pub const OPPOSING_HALF: [u8; 4] = [5, 6, 7, 8];

// Signal head character marking a movement with protected right-of-way
pub const PRIORITY_GREEN: char = 'G';

// Run parameter defaults
pub const DEFAULT_SIMS_PER_STEP: u32 = 1;
pub const DEFAULT_HORIZON: u32 = 3600;
pub const DEFAULT_WARMUP_TIME: u32 = 3600;
pub const DEFAULT_SIM_STEP: f64 = 1.0;
