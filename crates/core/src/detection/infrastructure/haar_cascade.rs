//! Haar cascade model: boosted stages of decision stumps over rectangle
//! features, read from OpenCV's cascade XML (the format of the stock
//! `haarcascade_frontalface_default.xml`).
//!
//! ```xml
//! <opencv_storage><cascade type_id="opencv-cascade-classifier">
//!   <stageType>BOOST</stageType> <featureType>HAAR</featureType>
//!   <height>24</height> <width>24</width>
//!   <stages><_>
//!     <stageThreshold>-5.0425500869750977e+00</stageThreshold>
//!     <weakClassifiers><_>
//!       <internalNodes>0 -1 0 -3.1511999666690826e-02</internalNodes>
//!       <leafValues>2.0875380039215088e+00 -2.2172100543975830e+00</leafValues>
//!     </_></weakClassifiers>
//!   </_></stages>
//!   <features><_><rects><_>6 4 12 9 -1.</_><_>6 7 12 3 3.</_></rects></_></features>
//! </cascade></opencv_storage>
//! ```

use std::fs;
use std::path::Path;
use std::str::FromStr;

use roxmltree::{Document, Node};

use crate::shared::error::CascadeLoadError;

/// Features combine at most this many weighted rectangles.
const MAX_FEATURE_RECTS: usize = 3;

/// Subtracted from every stage threshold on load, as OpenCV does.
const STAGE_THRESHOLD_EPS: f64 = 1e-5;

/// `internalNodes` of a stump: left child, right child, feature index, threshold.
const STUMP_NODE_FIELDS: usize = 4;

#[derive(Clone, Debug, PartialEq)]
pub struct HaarCascade {
    pub window_width: u32,
    pub window_height: u32,
    pub features: Vec<HaarFeature>,
    pub stages: Vec<CascadeStage>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HaarFeature {
    pub rects: Vec<WeightedRect>,
}

/// Rectangle in window coordinates with its contribution weight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub weight: f64,
}

/// A window survives the stage when the summed stump votes reach `threshold`.
#[derive(Clone, Debug, PartialEq)]
pub struct CascadeStage {
    pub threshold: f64,
    pub classifiers: Vec<WeakClassifier>,
}

/// Decision stump: votes `left` when the normalized feature value is below
/// `threshold`, `right` otherwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeakClassifier {
    pub feature: usize,
    pub threshold: f64,
    pub left: f64,
    pub right: f64,
}

impl HaarCascade {
    pub fn from_path(path: &Path) -> Result<Self, CascadeLoadError> {
        let text = fs::read_to_string(path).map_err(|e| CascadeLoadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let doc = Document::parse(&text).map_err(|e| CascadeLoadError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        let cascade = Self::from_document(&doc)?;
        cascade.validate()?;
        log::info!(
            "Loaded cascade {} ({} stages, {} features, {}x{} window)",
            path.display(),
            cascade.stages.len(),
            cascade.features.len(),
            cascade.window_width,
            cascade.window_height
        );
        Ok(cascade)
    }

    /// Read an OpenCV `opencv-cascade-classifier` document.
    ///
    /// Only boosted stumps over upright Haar features are supported; tilted
    /// features, LBP/HOG cascades and deeper trees are rejected as `Invalid`.
    pub fn from_document(doc: &Document) -> Result<Self, CascadeLoadError> {
        let cascade = child(doc.root_element(), "cascade").map_err(|_| {
            CascadeLoadError::Invalid(
                "missing <cascade> element (only the OpenCV 2.4+ cascade format is read)".into(),
            )
        })?;

        if let Some(kind) = optional_text(cascade, "stageType") {
            if kind != "BOOST" {
                return Err(CascadeLoadError::Invalid(format!(
                    "unsupported stage type {kind}"
                )));
            }
        }
        if let Some(kind) = optional_text(cascade, "featureType") {
            if kind != "HAAR" {
                return Err(CascadeLoadError::Invalid(format!(
                    "unsupported feature type {kind}"
                )));
            }
        }

        let window_width = parse_child(cascade, "width")?;
        let window_height = parse_child(cascade, "height")?;

        let stages = items(child(cascade, "stages")?)
            .enumerate()
            .map(|(si, node)| read_stage(si, node))
            .collect::<Result<Vec<_>, _>>()?;
        let features = items(child(cascade, "features")?)
            .enumerate()
            .map(|(fi, node)| read_feature(fi, node))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(declared) = optional_text(cascade, "stageNum") {
            if declared.parse::<usize>().ok() != Some(stages.len()) {
                log::warn!(
                    "cascade declares {declared} stages but holds {}",
                    stages.len()
                );
            }
        }

        Ok(Self {
            window_width,
            window_height,
            features,
            stages,
        })
    }

    /// Structural checks so evaluation never indexes out of range.
    pub fn validate(&self) -> Result<(), CascadeLoadError> {
        if self.window_width < 3 || self.window_height < 3 {
            return Err(CascadeLoadError::Invalid(format!(
                "window {}x{} is smaller than 3x3",
                self.window_width, self.window_height
            )));
        }
        if self.stages.is_empty() {
            return Err(CascadeLoadError::Invalid("cascade has no stages".into()));
        }
        for (fi, feature) in self.features.iter().enumerate() {
            if feature.rects.is_empty() || feature.rects.len() > MAX_FEATURE_RECTS {
                return Err(CascadeLoadError::Invalid(format!(
                    "feature {fi} has {} rects, expected 1..={MAX_FEATURE_RECTS}",
                    feature.rects.len()
                )));
            }
            for r in &feature.rects {
                if !fits(r.x, r.width, self.window_width)
                    || !fits(r.y, r.height, self.window_height)
                {
                    return Err(CascadeLoadError::Invalid(format!(
                        "feature {fi} rect {}x{}+{}+{} leaves the window",
                        r.width, r.height, r.x, r.y
                    )));
                }
            }
        }
        for (si, stage) in self.stages.iter().enumerate() {
            if stage.classifiers.is_empty() {
                return Err(CascadeLoadError::Invalid(format!(
                    "stage {si} has no classifiers"
                )));
            }
            if let Some(c) = stage
                .classifiers
                .iter()
                .find(|c| c.feature >= self.features.len())
            {
                return Err(CascadeLoadError::Invalid(format!(
                    "stage {si} references unknown feature {}",
                    c.feature
                )));
            }
        }
        Ok(())
    }
}

/// `offset + len <= limit` without wrapping.
fn fits(offset: u32, len: u32, limit: u32) -> bool {
    u64::from(offset) + u64::from(len) <= u64::from(limit)
}

fn read_stage(si: usize, node: Node) -> Result<CascadeStage, CascadeLoadError> {
    let threshold: f64 = parse_child(node, "stageThreshold")?;
    let classifiers = items(child(node, "weakClassifiers")?)
        .enumerate()
        .map(|(ci, weak)| {
            read_stump(weak).map_err(|e| in_context(e, &format!("stage {si} classifier {ci}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CascadeStage {
        threshold: threshold - STAGE_THRESHOLD_EPS,
        classifiers,
    })
}

fn read_stump(node: Node) -> Result<WeakClassifier, CascadeLoadError> {
    let nodes = text(child(node, "internalNodes")?);
    let fields: Vec<&str> = nodes.split_whitespace().collect();
    if fields.len() != STUMP_NODE_FIELDS {
        return Err(CascadeLoadError::Invalid(format!(
            "{} internalNodes values, only single-split stumps are supported",
            fields.len()
        )));
    }
    let leaves = numbers(&text(child(node, "leafValues")?))?;
    let &[left, right] = leaves.as_slice() else {
        return Err(CascadeLoadError::Invalid(format!(
            "{} leafValues, expected 2",
            leaves.len()
        )));
    };
    Ok(WeakClassifier {
        feature: number(fields[2])?,
        threshold: number(fields[3])?,
        left,
        right,
    })
}

fn read_feature(fi: usize, node: Node) -> Result<HaarFeature, CascadeLoadError> {
    if optional_text(node, "tilted").is_some_and(|t| t != "0") {
        return Err(CascadeLoadError::Invalid(format!(
            "feature {fi} is tilted, only upright features are supported"
        )));
    }
    let rects = items(child(node, "rects")?)
        .map(|r| {
            let values = numbers(&text(r))?;
            let &[x, y, width, height, weight] = values.as_slice() else {
                return Err(CascadeLoadError::Invalid(format!(
                    "feature {fi} rect has {} values, expected 5",
                    values.len()
                )));
            };
            Ok(WeightedRect {
                x: pixel_offset(fi, x)?,
                y: pixel_offset(fi, y)?,
                width: pixel_offset(fi, width)?,
                height: pixel_offset(fi, height)?,
                weight,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(HaarFeature { rects })
}

fn pixel_offset(fi: usize, v: f64) -> Result<u32, CascadeLoadError> {
    if v.fract() != 0.0 || v < 0.0 || v > f64::from(u32::MAX) {
        return Err(CascadeLoadError::Invalid(format!(
            "feature {fi} rect value {v} is not a pixel offset"
        )));
    }
    Ok(v as u32)
}

fn in_context(err: CascadeLoadError, context: &str) -> CascadeLoadError {
    match err {
        CascadeLoadError::Invalid(msg) => CascadeLoadError::Invalid(format!("{context}: {msg}")),
        other => other,
    }
}

/// The `<_>` entries of an OpenCV sequence node.
fn items<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(|n| n.is_element() && n.has_tag_name("_"))
}

fn child<'a, 'input>(
    node: Node<'a, 'input>,
    name: &str,
) -> Result<Node<'a, 'input>, CascadeLoadError> {
    node.children()
        .find(|n| n.is_element() && n.has_tag_name(name))
        .ok_or_else(|| {
            CascadeLoadError::Invalid(format!(
                "<{}> has no <{name}> element",
                node.tag_name().name()
            ))
        })
}

/// Text content with interleaved comments skipped.
fn text(node: Node) -> String {
    node.children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn optional_text(node: Node, name: &str) -> Option<String> {
    child(node, name).ok().map(text)
}

fn parse_child<T: FromStr>(node: Node, name: &str) -> Result<T, CascadeLoadError> {
    let raw = text(child(node, name)?);
    raw.parse()
        .map_err(|_| CascadeLoadError::Invalid(format!("<{name}> value {raw:?} is not a number")))
}

fn number<T: FromStr>(raw: &str) -> Result<T, CascadeLoadError> {
    raw.parse()
        .map_err(|_| CascadeLoadError::Invalid(format!("{raw:?} is not a number")))
}

fn numbers(raw: &str) -> Result<Vec<f64>, CascadeLoadError> {
    raw.split_whitespace().map(number::<f64>).collect()
}
