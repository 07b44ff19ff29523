pub const APP_NAME: &str = "spackle";

/// Length of the truncated hashes identifying specs and plans.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Recipe file extension inside a repository directory.
pub const RECIPE_EXTENSION: &str = "toml";

/// Recipe file name for the `<repo>/<name>/package.toml` layout.
pub const RECIPE_FILE_NAME: &str = "package.toml";

/// Colon-separated list of recipe repositories.
pub const REPO_ENV: &str = "SPACKLE_REPO";

/// Parallel jobs passed to `make`.
pub const JOBS_ENV: &str = "SPACKLE_JOBS";

pub const CONFIG_FILE_NAME: &str = "config.toml";
