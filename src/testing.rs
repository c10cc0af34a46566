//! Testing utilities.
//!
//! Builders for LightGBM model text, usable from unit tests and integration
//! tests alike.
//!
//! ```
//! use lgbm_export::testing::ModelTextBuilder;
//! use lgbm_export::GbdtModel;
//!
//! let text = ModelTextBuilder::regression(&["x"], &["[0:10]"])
//!     .tree(ModelTextBuilder::numeric_split(0, 4.5))
//!     .end_of_trees()
//!     .build();
//! let model = GbdtModel::from_string(&text).unwrap();
//! assert_eq!(model.num_trees(), 1);
//! ```

use crate::lightgbm::pandas::PANDAS_CATEGORICAL_PREFIX;

/// Textual form of LightGBM's zero threshold.
const BINARY_THRESHOLD_TEXT: &str = "1.0000000180025095e-35";

// =============================================================================
// Model text
// =============================================================================

enum Block {
    Tree(String),
    Raw(String),
}

/// Builds LightGBM model text block by block.
///
/// Tree blocks are numbered in the order they are added.
pub struct ModelTextBuilder {
    header: Vec<(String, Option<String>)>,
    blocks: Vec<Block>,
}

impl ModelTextBuilder {
    /// Header with the given features and `objective=regression`.
    pub fn regression(feature_names: &[&str], feature_infos: &[&str]) -> Self {
        let max_feature_idx = feature_names.len().saturating_sub(1);
        let mut builder = Self {
            header: Vec::new(),
            blocks: Vec::new(),
        };
        builder
            .set("version", "v3")
            .set("num_class", "1")
            .set("num_tree_per_iteration", "1")
            .set("label_index", "0")
            .set("max_feature_idx", &max_feature_idx.to_string())
            .set("objective", "regression")
            .set("feature_names", &feature_names.join(" "))
            .set("feature_infos", &feature_infos.join(" "));
        builder
    }

    fn set(&mut self, key: &str, value: &str) -> &mut Self {
        match self.header.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = Some(value.to_string()),
            None => self.header.push((key.to_string(), Some(value.to_string()))),
        }
        self
    }

    /// Set or replace a header key.
    pub fn header_entry(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    pub fn version(self, version: &str) -> Self {
        self.header_entry("version", version)
    }

    pub fn without_version(mut self) -> Self {
        self.header.retain(|(k, _)| k != "version");
        self
    }

    pub fn max_feature_idx(self, max_feature_idx: usize) -> Self {
        self.header_entry("max_feature_idx", &max_feature_idx.to_string())
    }

    pub fn objective(self, objective: &str) -> Self {
        self.header_entry("objective", objective)
    }

    /// Add the bare `boost_from_average` header line.
    pub fn boost_from_average(mut self) -> Self {
        self.header.push(("boost_from_average".to_string(), None));
        self
    }

    /// Append a tree body (without its `Tree=<n>` line).
    pub fn tree(mut self, body: String) -> Self {
        self.blocks.push(Block::Tree(body));
        self
    }

    pub fn end_of_trees(self) -> Self {
        self.raw_section("end of trees")
    }

    pub fn importances(self, entries: &[(&str, &str)]) -> Self {
        let mut text = String::from("feature_importances:");
        for (name, value) in entries {
            text.push_str(&format!("\n{name}={value}"));
        }
        self.raw_section(&text)
    }

    /// `parameters:` block followed directly by `end of parameters`.
    pub fn parameters(self, lines: &[&str]) -> Self {
        let mut text = String::from("parameters:");
        for line in lines {
            text.push('\n');
            text.push_str(line);
        }
        text.push_str("\nend of parameters");
        self.raw_section(&text)
    }

    pub fn pandas_categorical(self, table: &[Vec<String>]) -> Self {
        self.raw_section(&format_pandas_categorical(table))
    }

    /// Append a block verbatim.
    pub fn raw_section(mut self, text: &str) -> Self {
        self.blocks.push(Block::Raw(text.to_string()));
        self
    }

    pub fn build(&self) -> String {
        let mut out = String::from("tree\n");
        for (key, value) in &self.header {
            match value {
                Some(value) => out.push_str(&format!("{key}={value}\n")),
                None => out.push_str(&format!("{key}\n")),
            }
        }

        let mut tree_index = 0;
        for block in &self.blocks {
            out.push('\n');
            match block {
                Block::Tree(body) => {
                    out.push_str(&format!("Tree={tree_index}\n{body}\n"));
                    tree_index += 1;
                }
                Block::Raw(text) => {
                    out.push_str(text);
                    out.push('\n');
                }
            }
        }
        out
    }

    // -------------------------------------------------------------------------
    // Tree bodies
    // -------------------------------------------------------------------------

    /// Single-leaf tree.
    pub fn leaf(value: f64) -> String {
        format!("num_leaves=1\nnum_cat=0\nleaf_value={value}\nshrinkage=1")
    }

    /// Stump splitting `feature` at `threshold`.
    pub fn numeric_split(feature: usize, threshold: f64) -> String {
        stump(feature, &threshold.to_string(), 2, None)
    }

    /// Stump splitting `feature` at LightGBM's zero threshold.
    pub fn binary_split(feature: usize) -> String {
        stump(feature, BINARY_THRESHOLD_TEXT, 2, None)
    }

    /// Stump sending `categories` of `feature` left.
    pub fn categorical_split(feature: usize, categories: &[u32]) -> String {
        let words = categories.iter().map(|&c| c / 32 + 1).max().unwrap_or(1);
        let mut bitset = vec![0u32; words as usize];
        for &category in categories {
            bitset[(category / 32) as usize] |= 1 << (category % 32);
        }
        let bitset: Vec<String> = bitset.iter().map(u32::to_string).collect();
        let cat = format!("cat_boundaries=0 {words}\ncat_threshold={}", bitset.join(" "));
        stump(feature, "0", 1, Some(&cat))
    }
}

fn stump(feature: usize, threshold: &str, decision_type: i8, categorical: Option<&str>) -> String {
    let num_cat = usize::from(categorical.is_some());
    let mut body = format!(
        "num_leaves=2\nnum_cat={num_cat}\nsplit_feature={feature}\nsplit_gain=1\n\
         threshold={threshold}\ndecision_type={decision_type}\n\
         left_child=-1\nright_child=-2\nleaf_value=0.25 -0.25\n\
         leaf_weight=1 1\nleaf_count=10 10\n\
         internal_value=0\ninternal_weight=2\ninternal_count=20"
    );
    if let Some(categorical) = categorical {
        body.push('\n');
        body.push_str(categorical);
    }
    body.push_str("\nshrinkage=1");
    body
}

// =============================================================================
// Pandas literal
// =============================================================================

/// Format a label table the way the Python package writes it, quoting every
/// label.
pub fn format_pandas_categorical(table: &[Vec<String>]) -> String {
    if table.is_empty() {
        return format!("{PANDAS_CATEGORICAL_PREFIX}null");
    }

    let lists: Vec<String> = table
        .iter()
        .map(|labels| {
            let quoted: Vec<String> = labels
                .iter()
                .map(|label| format!("\"{}\"", label.replace('\\', "\\\\").replace('"', "\\\"")))
                .collect();
            format!("[{}]", quoted.join(", "))
        })
        .collect();

    format!("{PANDAS_CATEGORICAL_PREFIX}[{}]", lists.join(", "))
}
