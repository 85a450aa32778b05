use derive_builder::Builder;

/// What to do when a pass reads a resource that nothing has written.
///
/// Such reads see undefined content. Some passes do this on purpose, so the
/// frame graph does not decide on its own whether it is a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UninitializedReadPolicy {
    /// Record the read, stay silent.
    Allow,
    /// Record the read and log a warning.
    #[default]
    Warn,
    /// Record the read and fail it like any other invalid declaration.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(setter(into))]
pub struct FrameGraphConfig {
    #[builder(default)]
    pub uninitialized_reads: UninitializedReadPolicy,
    /// Bracket the frame and every pass with driver group markers.
    #[builder(default = "true")]
    pub debug_markers: bool,
    /// Name of the group marker around the whole frame.
    #[builder(default = "String::from(\"FrameGraph\")")]
    pub frame_marker: String,
    /// Verify that the dependency graph has no cycle before culling.
    #[builder(default = "cfg!(debug_assertions)")]
    pub check_acyclic: bool,
}

impl Default for FrameGraphConfig {
    fn default() -> Self {
        Self {
            uninitialized_reads: UninitializedReadPolicy::Warn,
            debug_markers: true,
            frame_marker: String::from("FrameGraph"),
            check_acyclic: cfg!(debug_assertions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_default() {
        let config = FrameGraphConfigBuilder::default().build().unwrap();
        assert_eq!(config, FrameGraphConfig::default());
    }

    #[test]
    fn builder_overrides() {
        let config = FrameGraphConfigBuilder::default()
            .uninitialized_reads(UninitializedReadPolicy::Reject)
            .debug_markers(false)
            .frame_marker("Shadows")
            .build()
            .unwrap();

        assert_eq!(config.uninitialized_reads, UninitializedReadPolicy::Reject);
        assert!(!config.debug_markers);
        assert_eq!(config.frame_marker, "Shadows");
    }
}
