//! Rendering mode reported by the surface owner

use std::fmt;

/// How decoded video reaches the screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RenderingMode {
    /// No mode reported yet
    #[default]
    Uninitialized,

    /// The surface owner presents directly on the hardware plane; the page
    /// only paints a hole
    PunchOut,

    /// Frames are pulled from the surface owner and composited as textures
    TextureCallback,

    /// Sentinel for a corrupt or unset wire value; never a legal mode
    Invalid,
}

impl RenderingMode {
    /// True for modes a surface owner may legitimately report
    pub fn is_valid(&self) -> bool {
        matches!(self, RenderingMode::PunchOut | RenderingMode::TextureCallback)
    }
}

impl fmt::Display for RenderingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RenderingMode::Uninitialized => "uninitialized",
            RenderingMode::PunchOut => "punch-out",
            RenderingMode::TextureCallback => "texture-callback",
            RenderingMode::Invalid => "invalid",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_modes() {
        assert!(RenderingMode::PunchOut.is_valid());
        assert!(RenderingMode::TextureCallback.is_valid());
        assert!(!RenderingMode::Uninitialized.is_valid());
        assert!(!RenderingMode::Invalid.is_valid());
        assert_eq!(RenderingMode::default(), RenderingMode::Uninitialized);
    }
}
