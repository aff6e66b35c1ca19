//! Edit request handling: inbound batch parsing, user patch callbacks and
//! validation of what the callbacks return.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::error::{DataViewError, Result};
use crate::patch::{CellPatch, CellValue};

/// Error type returned by user patch callbacks.
pub type PatchFnError = Box<dyn std::error::Error + Send + Sync>;

type PatchFuture<T> = BoxFuture<'static, std::result::Result<T, PatchFnError>>;

/// Maps one requested patch to the value that should be stored.
pub type PatchFn = Arc<dyn Fn(CellPatch) -> PatchFuture<CellValue> + Send + Sync>;

/// Maps a whole requested batch to the patches that should be stored.
pub type PatchesFn = Arc<dyn Fn(Vec<CellPatch>) -> PatchFuture<Vec<CellPatch>> + Send + Sync>;

/// The user callbacks of one output.
///
/// Without a batch callback each patch goes through the per-patch callback,
/// which by default accepts the requested value unchanged.
#[derive(Clone)]
pub struct PatchHandlers {
    patch_fn: PatchFn,
    patches_fn: Option<PatchesFn>,
}

impl Default for PatchHandlers {
    fn default() -> Self {
        Self {
            patch_fn: Arc::new(|patch: CellPatch| {
                async move { Ok::<_, PatchFnError>(patch.value) }.boxed()
            }),
            patches_fn: None,
        }
    }
}

impl fmt::Debug for PatchHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchHandlers")
            .field("custom_patches_fn", &self.patches_fn.is_some())
            .finish_non_exhaustive()
    }
}

impl PatchHandlers {
    pub fn set_patch_fn<F, Fut>(&mut self, f: F)
    where
        F: Fn(CellPatch) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<CellValue, PatchFnError>> + Send + 'static,
    {
        self.patch_fn = Arc::new(move |patch| f(patch).boxed());
    }

    pub fn set_patches_fn<F, Fut>(&mut self, f: F)
    where
        F: Fn(Vec<CellPatch>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Vec<CellPatch>, PatchFnError>> + Send + 'static,
    {
        self.patches_fn = Some(Arc::new(move |patches| f(patches).boxed()));
    }

    /// Run the callbacks over a parsed batch.
    pub async fn run(
        &self,
        patches: Vec<CellPatch>,
    ) -> std::result::Result<Vec<CellPatch>, PatchFnError> {
        if let Some(patches_fn) = &self.patches_fn {
            return patches_fn(patches).await;
        }
        let mut processed = Vec::with_capacity(patches.len());
        for patch in patches {
            let (row_index, column_index) = patch.key();
            let value = (self.patch_fn)(patch).await?;
            processed.push(CellPatch::new(row_index, column_index, value));
        }
        Ok(processed)
    }
}

/// Parse an inbound batch of `{row_index, column_index, value}` objects.
///
/// Any malformed entry rejects the whole batch.
pub fn parse_patch_batch(output_id: &str, batch: &Value) -> Result<Vec<CellPatch>> {
    let malformed = |index: usize, reason: String| DataViewError::MalformedPatch {
        output_id: output_id.to_string(),
        index,
        reason,
    };

    let Value::Array(entries) = batch else {
        return Err(malformed(0, format!("expected an array of patches, got {batch}")));
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let Value::Object(fields) = entry else {
                return Err(malformed(index, "expected an object".to_string()));
            };
            let position = |name: &str| {
                fields
                    .get(name)
                    .and_then(Value::as_u64)
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| {
                        malformed(index, format!("`{name}` must be a non-negative integer"))
                    })
            };
            let row_index = position("row_index")?;
            let column_index = position("column_index")?;
            let value = match fields.get("value") {
                Some(Value::String(text)) => CellValue::text(text.as_str()),
                Some(Value::Number(n)) => CellValue::text(n.to_string()),
                Some(Value::Bool(b)) => CellValue::text(b.to_string()),
                Some(object @ Value::Object(_)) => serde_json::from_value(object.clone())
                    .map_err(|err| malformed(index, format!("invalid `value`: {err}")))?,
                Some(_) | None => {
                    return Err(malformed(index, "missing `value`".to_string()));
                }
            };
            Ok(CellPatch::new(row_index, column_index, value))
        })
        .collect()
}

/// Check that every callback-produced patch addresses a cell of the data.
pub fn validate_patch_output(
    output_id: &str,
    patches: &[CellPatch],
    (nrows, ncols): (usize, usize),
) -> Result<()> {
    for (index, patch) in patches.iter().enumerate() {
        let reason = if patch.row_index >= nrows {
            format!("row_index {} is out of bounds for {nrows} rows", patch.row_index)
        } else if patch.column_index >= ncols {
            format!(
                "column_index {} is out of bounds for {ncols} columns",
                patch.column_index
            )
        } else {
            continue;
        };
        return Err(DataViewError::InvalidPatchOutput {
            output_id: output_id.to_string(),
            index,
            reason,
        });
    }
    Ok(())
}
