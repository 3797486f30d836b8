use bridge_types::{BridgeError, JobAssignment};

/// Job synthesis (§4.7 step 3): turns one [`JobAssignment`] into a
/// submittable job spec. The template engine itself is an external
/// collaborator (§1); this trait is the seam the matcher depends on.
pub trait JobSpecRenderer: Send + Sync {
    fn render(&self, assignment: &JobAssignment) -> Result<String, BridgeError>;
}

/// Fills a `{placeholder}`-style template. Placeholders: `{queue}`,
/// `{node_group}`, `{instance_type}`, `{price_per_hour}`.
pub struct TemplateJobSpecRenderer {
    template: String,
}

impl TemplateJobSpecRenderer {
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }
}

impl JobSpecRenderer for TemplateJobSpecRenderer {
    fn render(&self, assignment: &JobAssignment) -> Result<String, BridgeError> {
        Ok(self
            .template
            .replace("{queue}", &assignment.queue)
            .replace("{node_group}", &assignment.node_group)
            .replace("{instance_type}", &assignment.instance_type)
            .replace("{price_per_hour}", &assignment.price_per_hour.to_string()))
    }
}
