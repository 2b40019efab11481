//! JSON bodies returned by the recognition service.

use serde::{Deserialize, Serialize};

/// One ranked entry of the `top` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "songId")]
    pub song_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: i64,
}

/// Body of `POST /recognize`.
///
/// A clip that matched nothing comes back as `{"match": null, "score": 0}`;
/// every other field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    #[serde(rename = "match", default)]
    pub match_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub score: i64,
    /// Alignment offset of the clip inside the matched track, in
    /// fingerprint frames.
    #[serde(default)]
    pub offset_frames: Option<i64>,
    #[serde(default)]
    pub top: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecognitionResult {
    pub fn is_match(&self) -> bool {
        self.match_id.is_some()
    }

    /// Up to `n` ranked candidates, skipping the primary match.
    ///
    /// ```
    /// use clip_capture::sender::{Candidate, RecognitionResult};
    ///
    /// let cand = |id| Candidate { song_id: id, name: None, url: None, score: 1 };
    /// let result = RecognitionResult {
    ///     match_id: Some(2),
    ///     top: vec![cand(2), cand(7), cand(9)],
    ///     ..Default::default()
    /// };
    /// let alts: Vec<i64> = result.best_alternatives(3).map(|c| c.song_id).collect();
    /// assert_eq!(alts, vec![7, 9]);
    /// ```
    pub fn best_alternatives(&self, n: usize) -> impl Iterator<Item = &Candidate> + '_ {
        self.top
            .iter()
            .filter(move |c| Some(c.song_id) != self.match_id)
            .take(n)
    }

    /// Display name of the match, falling back to its id.
    pub fn title(&self) -> Option<String> {
        match (&self.name, self.match_id) {
            (Some(name), _) if !name.is_empty() => Some(name.clone()),
            (_, Some(id)) => Some(format!("#{id}")),
            _ => None,
        }
    }
}

/// Body of `POST /upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
