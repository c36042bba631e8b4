//! Debounces classifier output: an effect label must be reported several
//! frames in a row before it triggers anything.

use serde::{Deserialize, Serialize};

use crate::api::types::PoseLabel;
use crate::systems::commentary::Commentary;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Consecutive detections needed to trigger (default: 3).
    pub required: u32,
    /// Labels that may trigger an effect. Anything else resets the count.
    pub triggers: Vec<PoseLabel>,
    /// Commentary shown after the first, second, ... detection.
    pub progress_messages: Vec<String>,
    /// Commentary shown whenever the count resets.
    pub idle_message: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            required: 3,
            triggers: vec![
                PoseLabel::ChargedSphere,
                PoseLabel::PowerUp,
                PoseLabel::Teleport,
                PoseLabel::BeamPose,
            ],
            progress_messages: vec![
                "I sense ki from somewhere".to_string(),
                "The ki is getting stronger!!".to_string(),
            ],
            idle_message: "Detecting pose".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectionGate {
    config: DetectionConfig,
    current: Option<PoseLabel>,
    count: u32,
}

impl DetectionGate {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            current: None,
            count: 0,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn current(&self) -> Option<PoseLabel> {
        self.current
    }

    /// Record one classification. Returns true once `label` has been seen
    /// `required` times in a row; the count then starts over.
    pub fn observe(&mut self, label: Option<PoseLabel>, commentary: &mut Commentary) -> bool {
        let Some(label) = label.filter(|l| self.config.triggers.contains(l)) else {
            self.reset(commentary);
            return false;
        };
        if self.current == Some(label) {
            self.count += 1;
        } else {
            self.current = Some(label);
            self.count = 1;
        }
        if self.count >= self.config.required {
            log::debug!("{:?} confirmed after {} detections", label, self.count);
            self.current = None;
            self.count = 0;
            return true;
        }
        let progress = self.count as usize;
        if let Some(message) = progress
            .checked_sub(1)
            .and_then(|i| self.config.progress_messages.get(i))
        {
            commentary.update_message(message);
        }
        false
    }

    /// Drop any partial run and show the idle message.
    pub fn reset(&mut self, commentary: &mut Commentary) {
        self.current = None;
        self.count = 0;
        commentary.update_message(&self.config.idle_message);
    }
}

impl Default for DetectionGate {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}
