//! Editor request pipeline shared by every adapter.
//!
//! Adapters translate their environment's request into a [`GateRequest`],
//! call one of these functions, and render the result. The gate runs
//! first, so a rejected request never reaches the store.

use catalog_core::asset::AssetInput;
use catalog_core::gate::{self, Admission, GateRequest};
use catalog_core::submission::{Submission, SubmissionBody};
use catalog_store::WriteReceipt;
use catalog_sync::SyncReport;

use crate::error::AppResult;
use crate::state::AppState;

/// Gate, validate and synchronize a catalog submission.
pub async fn commit(state: &AppState, request: GateRequest<'_>) -> AppResult<Admission<SyncReport>> {
    let body = match gate::admit::<SubmissionBody>(&request, state.config.editor_secret.as_deref())? {
        Admission::Preflight => return Ok(Admission::Preflight),
        Admission::Proceed(body) => body,
    };

    let submission = Submission::try_from(body)?;
    tracing::info!(
        assets = submission.assets.len(),
        catalog = submission.catalog.is_some(),
        "Submission admitted",
    );

    let report = state.synchronizer().run(&submission).await?;
    Ok(Admission::Proceed(report))
}

/// Gate and write a single image, `{ filename, content_base64 }`.
pub async fn upload_image(
    state: &AppState,
    request: GateRequest<'_>,
) -> AppResult<Admission<WriteReceipt>> {
    let input = match gate::admit::<AssetInput>(&request, state.config.editor_secret.as_deref())? {
        Admission::Preflight => return Ok(Admission::Preflight),
        Admission::Proceed(input) => input,
    };

    let asset = input.into_single_asset()?;
    let receipt = state.synchronizer().upload_single(&asset).await?;
    tracing::info!(path = %receipt.path, created = receipt.created, "Image uploaded");
    Ok(Admission::Proceed(receipt))
}
