//! References to server-side extension libraries.
//!
//! Custom constraints, facets, and snippeters are installed under fixed
//! roots on the server. A library is identified by its file name; the
//! namespace is derived from the file name with its extension stripped.

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, Result};

const EXTENSIONS: [&str; 3] = ["xqy", "sjs", "js"];

/// Names a function in an installed library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRef {
    /// The function to call.
    pub apply: String,
    /// The library namespace.
    pub ns: String,
    /// The library location.
    pub at: String,
}

/// Where a library is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LibraryRoot {
    Query,
    Snippet,
}

impl LibraryRoot {
    fn segment(self) -> &'static str {
        match self {
            LibraryRoot::Query => "query",
            LibraryRoot::Snippet => "snippet",
        }
    }

    /// Builds the reference for `apply` in the library file `module`.
    pub(crate) fn reference(self, apply: &str, module: &str) -> Result<ModuleRef> {
        let root = rootname(module)?;
        Ok(ModuleRef {
            apply: apply.to_string(),
            ns: format!("http://marklogic.com/{}/custom/{root}", self.segment()),
            at: format!("/ext/marklogic/{}/custom/{module}", self.segment()),
        })
    }
}

/// Strips a recognized library extension from a file name.
pub fn rootname(module: &str) -> Result<&str> {
    module
        .rsplit_once('.')
        .filter(|(root, ext)| !root.is_empty() && EXTENSIONS.contains(ext))
        .map(|(root, _)| root)
        .ok_or_else(|| QueryError::MissingModuleExtension(module.to_string()))
}
