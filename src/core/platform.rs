use serde::{Deserialize, Serialize};

/// Target operating system, named the way version descriptors name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
    Osx,
}

impl Platform {
    /// Platform of the running binary.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Osx
        } else {
            Platform::Linux
        }
    }

    /// Name used in OS rules and legacy `natives` maps.
    pub fn os_name(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::Osx => "osx",
        }
    }

    /// Default classifier key for native archives, e.g. `natives-windows`.
    pub fn native_classifier(self) -> String {
        format!("natives-{}", self.os_name())
    }

    /// Value substituted for `${arch}` in legacy classifier templates.
    pub fn arch_bits() -> &'static str {
        if cfg!(target_pointer_width = "64") {
            "64"
        } else {
            "32"
        }
    }

    pub fn classpath_separator(self) -> &'static str {
        match self {
            Platform::Windows => ";",
            Platform::Linux | Platform::Osx => ":",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.os_name())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            "osx" | "macos" => Ok(Platform::Osx),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_uses_descriptor_os_name() {
        assert_eq!(Platform::Windows.native_classifier(), "natives-windows");
        assert_eq!(Platform::Osx.native_classifier(), "natives-osx");
    }

    #[test]
    fn parses_macos_alias() {
        assert_eq!("macos".parse::<Platform>().unwrap(), Platform::Osx);
        assert!("beos".parse::<Platform>().is_err());
    }
}
