//! Visual Studio toolset selection for Windows builds.

/// MSVC platform toolset paired with its Visual Studio release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsvsToolset {
    /// Platform toolset major (`v140`-style numbering without the `v`)
    pub toolset: u32,
    /// Visual Studio release year
    pub version: u32,
}

impl MsvsToolset {
    pub const VS2013: MsvsToolset = MsvsToolset {
        toolset: 12,
        version: 2013,
    };

    pub const VS2017: MsvsToolset = MsvsToolset {
        toolset: 15,
        version: 2017,
    };

    /// Pick the toolset for a host runtime major version.
    pub fn for_host_major(major: u64) -> Self {
        if major >= 4 {
            Self::VS2017
        } else {
            Self::VS2013
        }
    }
}
