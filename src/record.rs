use serde::{Deserialize, Serialize};

/// One catalog entry, merged from a listing card and its detail page.
///
/// Field names match the snapshot JSON exactly. `gitlab` is the label of the
/// card's "linked code" badge; the name is historical and does not imply the
/// hosting platform.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct PaperRecord {
    pub title: String,
    pub authors: String,
    pub gitlab: String,
    pub date: String,
    pub cover_img: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub strip_abstract: String,
    pub arxiv_url: String,
    pub entity_stars: String,
    pub stars_accumulated: String,
    pub paper_task: Vec<String>,
    pub code: Vec<String>,
}
