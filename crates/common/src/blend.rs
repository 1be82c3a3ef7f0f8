//! Blend mode definitions for layer compositing.

use serde::{Deserialize, Serialize};

use crate::gpu::BlendState;

/// Blend modes for compositing layers.
///
/// A mode is *trivial* when it can be expressed purely through fixed-function
/// source/destination blend factors. Every other mode is a function of both
/// source and destination color and must be computed in the fragment stage,
/// which requires snapshotting the destination first (a color target cannot
/// be sampled while bound for writing).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Add,
    Subtract,
}

impl BlendMode {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Multiply => "Multiply",
            Self::Screen => "Screen",
            Self::Overlay => "Overlay",
            Self::Darken => "Darken",
            Self::Lighten => "Lighten",
            Self::ColorDodge => "Color Dodge",
            Self::ColorBurn => "Color Burn",
            Self::HardLight => "Hard Light",
            Self::SoftLight => "Soft Light",
            Self::Difference => "Difference",
            Self::Exclusion => "Exclusion",
            Self::Add => "Add",
            Self::Subtract => "Subtract",
        }
    }

    /// Integer constant selecting this mode in the blend shader's switch.
    pub fn shader_index(self) -> u32 {
        match self {
            Self::Normal => 0,
            Self::Multiply => 1,
            Self::Screen => 2,
            Self::Overlay => 3,
            Self::Darken => 4,
            Self::Lighten => 5,
            Self::ColorDodge => 6,
            Self::ColorBurn => 7,
            Self::HardLight => 8,
            Self::SoftLight => 9,
            Self::Difference => 10,
            Self::Exclusion => 11,
            Self::Add => 12,
            Self::Subtract => 13,
        }
    }

    /// The fixed-function blend state for this mode, if one exists.
    ///
    /// `Normal` is plain source-over alpha; `Add` maps to additive blending.
    /// All remaining modes read the destination color and return `None`.
    pub fn native_state(self) -> Option<BlendState> {
        match self {
            Self::Normal => Some(BlendState::AlphaOver),
            Self::Add => Some(BlendState::Additive),
            _ => None,
        }
    }

    /// Whether this mode needs no destination-color read in the shader.
    pub fn is_trivial(self) -> bool {
        self.native_state().is_some()
    }

    /// All blend modes in display order.
    pub fn all() -> &'static [BlendMode] {
        &[
            Self::Normal,
            Self::Multiply,
            Self::Screen,
            Self::Overlay,
            Self::Darken,
            Self::Lighten,
            Self::ColorDodge,
            Self::ColorBurn,
            Self::HardLight,
            Self::SoftLight,
            Self::Difference,
            Self::Exclusion,
            Self::Add,
            Self::Subtract,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_is_index_zero() {
        assert_eq!(BlendMode::Normal.shader_index(), 0);
    }

    #[test]
    fn shader_indices_all_unique() {
        let all = BlendMode::all();
        for (i, a) in all.iter().enumerate() {
            for (j, b) in all.iter().enumerate() {
                if i != j {
                    assert_ne!(
                        a.shader_index(),
                        b.shader_index(),
                        "Duplicate shader index for {a:?} and {b:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn only_fixed_function_modes_are_trivial() {
        for mode in BlendMode::all() {
            let expected = matches!(mode, BlendMode::Normal | BlendMode::Add);
            assert_eq!(mode.is_trivial(), expected, "{mode:?}");
        }
    }

    #[test]
    fn native_states_match_modes() {
        assert_eq!(BlendMode::Normal.native_state(), Some(BlendState::AlphaOver));
        assert_eq!(BlendMode::Add.native_state(), Some(BlendState::Additive));
        assert_eq!(BlendMode::Multiply.native_state(), None);
    }
}
