// src/tasks/clean.rs

use tracing::info;

use crate::context::BuildContext;
use crate::errors::{PipelineError, Result};

/// Delete the whole output tree. A missing tree is not an error.
pub fn clean(ctx: &BuildContext) -> Result<()> {
    let out = ctx.output_root();
    ctx.fs()
        .remove_dir_all(out)
        .map_err(|source| PipelineError::Filesystem {
            path: out.to_path_buf(),
            source,
        })?;
    info!(path = %out.display(), "output tree removed");
    Ok(())
}
