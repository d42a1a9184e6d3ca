use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// The declarative registry driving a build.
///
/// Every section is optional. Map sections keep their declaration order,
/// which fixes the order sources are loaded and products are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub sources: IndexMap<String, SourceConfig>,
    #[serde(default)]
    pub mappings: Vec<MappingRule>,
    #[serde(default)]
    pub fieldsets: IndexMap<String, FieldsetDef>,
    /// Pivot blocks shared by name across products.
    #[serde(default)]
    pub pivots: IndexMap<String, PivotSpec>,
    #[serde(default, deserialize_with = "products_or_empty")]
    pub products: IndexMap<String, ProductDef>,
}

/// How one external source joins onto the crosswalk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Crosswalk field whose value is looked up in the source's keyed records.
    pub crosswalk_key: String,
    #[serde(default)]
    pub preprocess: Vec<PreprocessRule>,
}

/// Derives `field` by rendering `template` against the source record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessRule {
    pub field: String,
    pub template: String,
}

/// Resolves output field `dest` from one or more dotted intermediate paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    pub dest: String,
    pub src: MappingSource,
}

/// A single dotted path, or an ordered list tried first-non-empty-wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingSource {
    Path(String),
    Fallback(Vec<String>),
}

impl MappingSource {
    /// The paths in evaluation order.
    pub fn paths(&self) -> &[String] {
        match self {
            Self::Path(path) => std::slice::from_ref(path),
            Self::Fallback(paths) => paths,
        }
    }
}

/// A named field list that may pull in other fieldsets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldsetDef {
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub fieldsets: Vec<String>,
}

/// One output view of the registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductDef {
    #[serde(default)]
    pub fieldsets: Vec<String>,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub pivots: Vec<PivotRef>,
}

/// A product's pivot entry: a shared pivot name or an inline block.
///
/// Any other shape is kept as raw JSON so plan compilation can report it
/// instead of failing the whole file parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PivotRef {
    Named(String),
    Inline(PivotSpec),
    Unsupported(serde_json::Value),
}

/// A block of pivot fields written together into one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotSpec {
    /// Directory name under the product directory.
    pub name: String,
    pub fields: Vec<PivotField>,
}

/// One grouped index, written as `<name>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotField {
    pub name: String,
    /// Output field to group by.
    pub field: String,
    /// Second grouping level inside each `field` bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subfield: Option<String>,
    /// Bucket holds every matching record when true, only the last when false.
    #[serde(default = "default_is_array")]
    pub is_array: bool,
    /// Key used when the grouping value is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_key: Option<String>,
}

fn default_is_array() -> bool {
    true
}

// `products: { ids: }` declares a product with a null body.
fn products_or_empty<'de, D>(deserializer: D) -> Result<IndexMap<String, ProductDef>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = IndexMap::<String, Option<ProductDef>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(name, product)| (name, product.unwrap_or_default()))
        .collect())
}
