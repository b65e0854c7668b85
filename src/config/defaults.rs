//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn url() -> Option<String> {
        None
    }

    pub fn author() -> String {
        "<YOUR_NAME>".into()
    }

    pub fn email() -> String {
        "user@noreply.pressroom".into()
    }

    pub fn language() -> String {
        "en".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn path_prefix() -> PathBuf {
        "".into()
    }

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn assets() -> PathBuf {
        "assets".into()
    }

    pub mod feed {
        use std::path::PathBuf;

        pub fn path() -> PathBuf {
            "feed.xml".into()
        }

        pub fn limit() -> usize {
            20
        }
    }

    pub mod sitemap {
        use std::path::PathBuf;

        pub fn path() -> PathBuf {
            "sitemap.xml".into()
        }
    }

    pub mod slug {
        use super::super::super::SlugMode;

        pub fn safe() -> SlugMode {
            SlugMode::Safe
        }

        pub fn on() -> SlugMode {
            SlugMode::On
        }
    }
}

// ============================================================================
// [checkout] Section Defaults
// ============================================================================

pub mod checkout {
    pub fn branch() -> String {
        "main".into()
    }
}

// ============================================================================
// [deploy] Section Defaults
// ============================================================================

pub mod deploy {
    pub fn message() -> String {
        "deploy {digest}".into()
    }

    pub mod github {
        pub fn branch() -> String {
            "gh-pages".into()
        }

        pub fn token_env() -> Option<String> {
            Some("GITHUB_TOKEN".into())
        }
    }
}
