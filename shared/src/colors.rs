use crate::algorithm::AlgorithmId;

/// Fixed path color per algorithm as (r, g, b).
pub fn path_rgb(id: AlgorithmId) -> (u8, u8, u8) {
    match id {
        AlgorithmId::Dp => (0xe5, 0x39, 0x35),
        AlgorithmId::Dr => (0x1e, 0x88, 0xe5),
        AlgorithmId::Squish => (0x43, 0xa0, 0x47),
        AlgorithmId::SquishE => (0x8e, 0x24, 0xaa),
        AlgorithmId::SquishReckoning => (0xfb, 0x8c, 0x00),
        AlgorithmId::UniformSampling => (0x00, 0xac, 0xc1),
        AlgorithmId::Raw => (0x54, 0x6e, 0x7a),
    }
}

/// `#rrggbb` form of an RGB triple.
pub fn to_hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

impl AlgorithmId {
    /// CSS color for every path drawn for this algorithm.
    pub fn path_color(self) -> String {
        to_hex(path_rgb(self))
    }
}
