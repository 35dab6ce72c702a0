//! Fixed dimensions of the cathode and anode trigger electronics.

/// Layers per chamber.
pub const NLAYERS: usize = 6;

/// Layer whose centre cell anchors every pattern (third layer, 0-based).
pub const KEY_LAYER: usize = 2;

/// Half-strip columns spanned by a cathode pattern template.
pub const MAX_PATTERN_WIDTH: usize = 11;

/// Column of the key half-strip inside a pattern template.
pub const PATTERN_CENTER: usize = MAX_PATTERN_WIDTH / 2;

/// Positions a single layer can report inside a comparator code.
pub const CODE_SLOTS: usize = 3;

/// Number of distinct comparator codes, one base-4 digit per layer.
pub const N_COMPARATOR_CODES: u32 = 1 << (2 * NLAYERS);

/// Half-strips read out by one cathode front-end board.
pub const HALF_STRIPS_PER_CFEB: usize = 32;

/// Largest CFEB count of any chamber type (ME1/1).
pub const MAX_CFEBS: usize = 7;

/// Largest half-strip index plus one extra column for the layer stagger.
pub const N_MAX_HALF_STRIPS: usize = MAX_CFEBS * HALF_STRIPS_PER_CFEB + 1;

/// Empty columns on each side of the occupancy grid.
///
/// With this padding a pattern placed at horizontal index `h` has its key
/// column on half-strip `h`, so edge half-strips are reachable without
/// negative offsets.
pub const PATTERN_PAD: usize = MAX_PATTERN_WIDTH / 2;

/// Width of the padded cathode occupancy grid.
pub const PADDED_HALF_STRIPS: usize = N_MAX_HALF_STRIPS + 2 * PATTERN_PAD;

/// Largest wire-group count of any chamber type (ME2/1).
pub const N_KEY_WIRE_GROUPS: usize = 112;

/// Cathode candidates reported per chamber.
pub const CLCT_SLOTS: usize = 2;

/// Anode candidates reported per chamber.
pub const ALCT_SLOTS: usize = 2;

/// Bunch crossings an anode hit stays asserted after it fires.
pub const WIRE_HIT_PERSISTENCE: u8 = 6;

/// Single-hit resolution of a half-strip comparator, in half-strips.
pub const HALF_STRIP_RESOLUTION: f32 = 0.288_675_13; // 1/sqrt(12)
