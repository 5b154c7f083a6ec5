//! Submission payloads accepted by the editor endpoints.

use serde::Deserialize;

use crate::asset::{Asset, AssetInput};
use crate::catalog::CatalogDocument;
use crate::error::CoreError;

/// Wire shape of a commit request body.
///
/// `{ "manhwas"?: CatalogDocument, "images"?: [{ filename, content_base64 }] }`.
/// Both fields are optional; `null` counts as absent.
#[derive(Debug, Default, Deserialize)]
pub struct SubmissionBody {
    #[serde(default)]
    pub manhwas: Option<CatalogDocument>,
    #[serde(default)]
    pub images: Option<Vec<AssetInput>>,
}

/// One validated submission: an optional catalog plus zero or more assets,
/// in the order they will be written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub catalog: Option<CatalogDocument>,
    pub assets: Vec<Asset>,
}

impl Submission {
    pub fn is_empty(&self) -> bool {
        self.catalog.is_none() && self.assets.is_empty()
    }
}

impl TryFrom<SubmissionBody> for Submission {
    type Error = CoreError;

    /// Every asset entry must carry a filename and content. The first
    /// malformed entry fails the whole submission.
    fn try_from(body: SubmissionBody) -> Result<Self, Self::Error> {
        let assets = body
            .images
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, input)| input.into_asset(index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            catalog: body.manhwas,
            assets,
        })
    }
}
