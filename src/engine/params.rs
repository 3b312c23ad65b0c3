//! Typed hyperparameter sets for the three engine families.
//!
//! Each family has a base set shared by its CPU and GPU variants and a patch
//! type whose `Some` fields replace the base value. Patches read from config
//! reject unknown keys, so a misspelt parameter fails at load time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::EngineKind;

/// Boosting rounds shared by every engine in the standard matrix.
pub const DEFAULT_TREES: usize = 100;

fn overlay<T: Clone>(slot: &mut T, patch: &Option<T>) {
    if let Some(value) = patch {
        *slot = value.clone();
    }
}

fn overlay_opt<T: Clone>(slot: &mut Option<T>, patch: &Option<T>) {
    if patch.is_some() {
        *slot = patch.clone();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XgbTreeMethod {
    Exact,
    Hist,
    GpuExact,
    GpuHist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XgbGrowPolicy {
    Depthwise,
    Lossguide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XgbObjective {
    #[serde(rename = "binary:logistic")]
    BinaryLogistic,
    #[serde(rename = "gpu:binary:logistic")]
    GpuBinaryLogistic,
}

/// XGBoost-style parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XgbParams {
    pub eta: f64,
    pub gamma: f64,
    pub learning_rate: f64,
    pub max_depth: u32,
    pub max_leaves: u32,
    pub min_child_weight: f64,
    pub num_round: usize,
    pub reg_lambda: f64,
    pub scale_pos_weight: f64,
    pub subsample: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_method: Option<XgbTreeMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grow_policy: Option<XgbGrowPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<XgbObjective>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nthread: Option<usize>,
}

/// Replacement values for [`XgbParams`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct XgbPatch {
    pub eta: Option<f64>,
    pub gamma: Option<f64>,
    pub learning_rate: Option<f64>,
    pub max_depth: Option<u32>,
    pub max_leaves: Option<u32>,
    pub min_child_weight: Option<f64>,
    pub num_round: Option<usize>,
    pub reg_lambda: Option<f64>,
    pub scale_pos_weight: Option<f64>,
    pub subsample: Option<f64>,
    pub tree_method: Option<XgbTreeMethod>,
    pub grow_policy: Option<XgbGrowPolicy>,
    pub objective: Option<XgbObjective>,
    pub nthread: Option<usize>,
}

impl XgbParams {
    pub fn base(n_trees: usize) -> Self {
        Self {
            eta: 0.1,
            gamma: 0.1,
            learning_rate: 0.1,
            max_depth: 8,
            max_leaves: 1 << 8,
            min_child_weight: 30.0,
            num_round: n_trees,
            reg_lambda: 1.0,
            scale_pos_weight: 2.0,
            subsample: 1.0,
            tree_method: None,
            grow_policy: None,
            objective: None,
            nthread: None,
        }
    }

    pub fn patched(mut self, patch: &XgbPatch) -> Self {
        overlay(&mut self.eta, &patch.eta);
        overlay(&mut self.gamma, &patch.gamma);
        overlay(&mut self.learning_rate, &patch.learning_rate);
        overlay(&mut self.max_depth, &patch.max_depth);
        overlay(&mut self.max_leaves, &patch.max_leaves);
        overlay(&mut self.min_child_weight, &patch.min_child_weight);
        overlay(&mut self.num_round, &patch.num_round);
        overlay(&mut self.reg_lambda, &patch.reg_lambda);
        overlay(&mut self.scale_pos_weight, &patch.scale_pos_weight);
        overlay(&mut self.subsample, &patch.subsample);
        overlay_opt(&mut self.tree_method, &patch.tree_method);
        overlay_opt(&mut self.grow_policy, &patch.grow_policy);
        overlay_opt(&mut self.objective, &patch.objective);
        overlay_opt(&mut self.nthread, &patch.nthread);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LgbObjective {
    Binary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LgbTask {
    Train,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LgbDevice {
    Cpu,
    Gpu,
}

/// LightGBM-style parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LgbParams {
    pub learning_rate: f64,
    pub min_child_weight: f64,
    pub min_split_gain: f64,
    pub num_leaves: u32,
    pub num_round: usize,
    pub objective: LgbObjective,
    pub reg_lambda: f64,
    pub scale_pos_weight: f64,
    pub subsample: f64,
    pub task: LgbTask,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nthread: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<LgbDevice>,
}

/// Replacement values for [`LgbParams`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LgbPatch {
    pub learning_rate: Option<f64>,
    pub min_child_weight: Option<f64>,
    pub min_split_gain: Option<f64>,
    pub num_leaves: Option<u32>,
    pub num_round: Option<usize>,
    pub objective: Option<LgbObjective>,
    pub reg_lambda: Option<f64>,
    pub scale_pos_weight: Option<f64>,
    pub subsample: Option<f64>,
    pub task: Option<LgbTask>,
    pub nthread: Option<usize>,
    pub device: Option<LgbDevice>,
}

impl LgbParams {
    pub fn base(n_trees: usize) -> Self {
        Self {
            learning_rate: 0.1,
            min_child_weight: 30.0,
            min_split_gain: 0.1,
            num_leaves: 1 << 8,
            num_round: n_trees,
            objective: LgbObjective::Binary,
            reg_lambda: 1.0,
            scale_pos_weight: 2.0,
            subsample: 1.0,
            task: LgbTask::Train,
            nthread: None,
            device: None,
        }
    }

    pub fn patched(mut self, patch: &LgbPatch) -> Self {
        overlay(&mut self.learning_rate, &patch.learning_rate);
        overlay(&mut self.min_child_weight, &patch.min_child_weight);
        overlay(&mut self.min_split_gain, &patch.min_split_gain);
        overlay(&mut self.num_leaves, &patch.num_leaves);
        overlay(&mut self.num_round, &patch.num_round);
        overlay(&mut self.objective, &patch.objective);
        overlay(&mut self.reg_lambda, &patch.reg_lambda);
        overlay(&mut self.scale_pos_weight, &patch.scale_pos_weight);
        overlay(&mut self.subsample, &patch.subsample);
        overlay(&mut self.task, &patch.task);
        overlay_opt(&mut self.nthread, &patch.nthread);
        overlay_opt(&mut self.device, &patch.device);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatLoss {
    Logloss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CatTaskType {
    Cpu,
    Gpu,
}

/// CatBoost-style parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatParams {
    pub depth: u32,
    pub iterations: usize,
    pub l2_leaf_reg: f64,
    pub learning_rate: f64,
    pub loss_function: CatLoss,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<CatTaskType>,
}

/// Replacement values for [`CatParams`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatPatch {
    pub depth: Option<u32>,
    pub iterations: Option<usize>,
    pub l2_leaf_reg: Option<f64>,
    pub learning_rate: Option<f64>,
    pub loss_function: Option<CatLoss>,
    pub thread_count: Option<usize>,
    pub task_type: Option<CatTaskType>,
}

impl CatParams {
    pub fn base(n_trees: usize) -> Self {
        Self {
            depth: 8,
            iterations: n_trees,
            l2_leaf_reg: 0.1,
            learning_rate: 0.1,
            loss_function: CatLoss::Logloss,
            thread_count: None,
            task_type: None,
        }
    }

    pub fn patched(mut self, patch: &CatPatch) -> Self {
        overlay(&mut self.depth, &patch.depth);
        overlay(&mut self.iterations, &patch.iterations);
        overlay(&mut self.l2_leaf_reg, &patch.l2_leaf_reg);
        overlay(&mut self.learning_rate, &patch.learning_rate);
        overlay(&mut self.loss_function, &patch.loss_function);
        overlay_opt(&mut self.thread_count, &patch.thread_count);
        overlay_opt(&mut self.task_type, &patch.task_type);
        self
    }
}

/// Effective parameters for one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EngineParams {
    XGBoost(XgbParams),
    LightGbm(LgbParams),
    CatBoost(CatParams),
}

impl EngineParams {
    pub fn kind(&self) -> EngineKind {
        match self {
            EngineParams::XGBoost(_) => EngineKind::XGBoost,
            EngineParams::LightGbm(_) => EngineKind::LightGbm,
            EngineParams::CatBoost(_) => EngineKind::CatBoost,
        }
    }

    /// Number of boosting rounds.
    pub fn rounds(&self) -> usize {
        match self {
            EngineParams::XGBoost(p) => p.num_round,
            EngineParams::LightGbm(p) => p.num_round,
            EngineParams::CatBoost(p) => p.iterations,
        }
    }

    pub fn learning_rate(&self) -> f64 {
        match self {
            EngineParams::XGBoost(p) => p.learning_rate,
            EngineParams::LightGbm(p) => p.learning_rate,
            EngineParams::CatBoost(p) => p.learning_rate,
        }
    }

    /// L2 penalty on leaf values.
    pub fn l2_regularization(&self) -> f64 {
        match self {
            EngineParams::XGBoost(p) => p.reg_lambda,
            EngineParams::LightGbm(p) => p.reg_lambda,
            EngineParams::CatBoost(p) => p.l2_leaf_reg,
        }
    }

    /// Weight applied to positive rows in the loss (1.0 when unset).
    pub fn positive_weight(&self) -> f64 {
        match self {
            EngineParams::XGBoost(p) => p.scale_pos_weight,
            EngineParams::LightGbm(p) => p.scale_pos_weight,
            EngineParams::CatBoost(_) => 1.0,
        }
    }

    pub fn threads(&self) -> Option<usize> {
        match self {
            EngineParams::XGBoost(p) => p.nthread,
            EngineParams::LightGbm(p) => p.nthread,
            EngineParams::CatBoost(p) => p.thread_count,
        }
    }

    /// Flat `key -> value` rendering in the engine's own vocabulary.
    pub fn to_param_map(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(self) else {
            return out;
        };
        for (key, value) in fields {
            let rendered = match value {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            };
            out.insert(key, rendered);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_fields_win_and_others_stay() {
        let patch = XgbPatch {
            tree_method: Some(XgbTreeMethod::Hist),
            max_depth: Some(6),
            ..XgbPatch::default()
        };
        let params = XgbParams::base(100).patched(&patch);
        assert_eq!(params.tree_method, Some(XgbTreeMethod::Hist));
        assert_eq!(params.max_depth, 6);
        assert_eq!(params.eta, 0.1);
        assert_eq!(params.num_round, 100);
        assert_eq!(params.nthread, None);
    }

    #[test]
    fn param_map_uses_engine_vocabulary() {
        let params = EngineParams::XGBoost(XgbParams::base(50).patched(&XgbPatch {
            tree_method: Some(XgbTreeMethod::GpuHist),
            objective: Some(XgbObjective::GpuBinaryLogistic),
            ..XgbPatch::default()
        }));
        let map = params.to_param_map();
        assert_eq!(map["tree_method"], "gpu_hist");
        assert_eq!(map["objective"], "gpu:binary:logistic");
        assert_eq!(map["num_round"], "50");
        assert_eq!(map["max_leaves"], "256");
        assert!(!map.contains_key("nthread"));
        assert!(!map.contains_key("grow_policy"));
    }

    #[test]
    fn catboost_task_type_renders_uppercase() {
        let params = EngineParams::CatBoost(CatParams::base(100).patched(&CatPatch {
            task_type: Some(CatTaskType::Gpu),
            ..CatPatch::default()
        }));
        let map = params.to_param_map();
        assert_eq!(map["task_type"], "GPU");
        assert_eq!(map["loss_function"], "Logloss");
        assert_eq!(params.rounds(), 100);
        assert_eq!(params.l2_regularization(), 0.1);
    }

    #[test]
    fn unknown_patch_keys_are_rejected() {
        let err = toml::from_str::<LgbPatch>("num_leafs = 31").unwrap_err();
        assert!(err.to_string().contains("num_leafs"), "{err}");
        let ok = toml::from_str::<LgbPatch>("num_leaves = 31\ndevice = \"gpu\"").unwrap();
        assert_eq!(ok.num_leaves, Some(31));
        assert_eq!(ok.device, Some(LgbDevice::Gpu));
    }
}
