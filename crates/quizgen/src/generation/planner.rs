//! Batch planning: turning a generation request into rendered prompts

use std::collections::BTreeMap;

use crate::config::GenerationConfig;
use crate::prompts::{BUILT_IN_DEFAULT, DEFAULT_TYPE};

/// Everything the planner needs to render one generation request
pub struct PlanRequest<'a> {
    /// Requested question types
    pub types: &'a [String],
    /// Per-type counts; when non-empty this selects the per-type strategy
    pub type_counts: Option<&'a BTreeMap<String, u32>>,
    /// Flat total for the mixed strategy
    pub quantity: Option<u32>,
    /// Extra instructions appended verbatim
    pub custom_requirements: Option<&'a str>,
    /// Rendered persona introduction
    pub persona_intro: &'a str,
    /// Reference context block
    pub context: &'a str,
    /// Templates keyed by question type
    pub templates: &'a std::collections::HashMap<String, String>,
}

/// Splits requested question counts into bounded batches and renders one
/// prompt per batch.
pub struct BatchPlanner {
    batch_size: u32,
    default_quantity: u32,
}

impl BatchPlanner {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            default_quantity: config.default_quantity,
        }
    }

    /// Produce the ordered list of prompts for a request.
    ///
    /// With explicit per-type counts, each type gets its own template and
    /// its own batches; otherwise a flat total is generated from the
    /// default template with the combined type list substituted in.
    pub fn plan(&self, request: &PlanRequest<'_>) -> Vec<String> {
        let mut prompts = Vec::new();

        match request.type_counts.filter(|counts| !counts.is_empty()) {
            Some(counts) => {
                tracing::info!("Using type-based batching strategy: {:?}", counts);
                for (question_type, &count) in counts {
                    if count == 0 {
                        continue;
                    }
                    let template = template_for(request.templates, question_type);
                    for size in batch_sizes(count, self.batch_size) {
                        prompts.push(render_prompt(
                            template,
                            request.persona_intro,
                            question_type,
                            request.context,
                            size,
                            request.custom_requirements,
                        ));
                    }
                }
            }
            None => {
                tracing::info!("Using mixed batching strategy");
                let total = request.quantity.unwrap_or(self.default_quantity);
                let type_list = request.types.join(", ");
                let template = template_for(request.templates, DEFAULT_TYPE);
                for size in batch_sizes(total, self.batch_size) {
                    prompts.push(render_prompt(
                        template,
                        request.persona_intro,
                        &type_list,
                        request.context,
                        size,
                        request.custom_requirements,
                    ));
                }
            }
        }

        prompts
    }
}

/// Split a count into batches of at most `batch_size`; the final batch
/// carries the remainder.
fn batch_sizes(count: u32, batch_size: u32) -> Vec<u32> {
    if count == 0 || batch_size == 0 {
        return Vec::new();
    }
    let batches = count.div_ceil(batch_size);
    (0..batches)
        .map(|i| {
            if i == batches - 1 {
                count - i * batch_size
            } else {
                batch_size
            }
        })
        .collect()
}

/// Resolve a template, falling back to the default and then the built-in
fn template_for<'a>(
    templates: &'a std::collections::HashMap<String, String>,
    question_type: &str,
) -> &'a str {
    templates
        .get(question_type)
        .or_else(|| templates.get(DEFAULT_TYPE))
        .map(String::as_str)
        .unwrap_or(BUILT_IN_DEFAULT)
}

fn render_prompt(
    template: &str,
    persona_intro: &str,
    question_type: &str,
    context: &str,
    quantity: u32,
    custom_requirements: Option<&str>,
) -> String {
    let mut prompt = template
        .replace("${persona_intro}", persona_intro)
        .replace("${type}", question_type)
        .replace("${context}", context);

    if prompt.contains("${quantity}") {
        prompt = prompt.replace("${quantity}", &quantity.to_string());
    } else {
        // A template without the placeholder must still carry the count
        prompt.push_str(&format!(
            "\n\nGenerate {} questions for this batch.",
            quantity
        ));
    }

    if let Some(requirements) = custom_requirements {
        prompt.push_str(&format!("\n\nAdditional requirements: {}", requirements));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn planner() -> BatchPlanner {
        BatchPlanner::new(&GenerationConfig::default())
    }

    fn templates(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn batch_sizes_split_with_remainder() {
        assert_eq!(batch_sizes(12, 5), vec![5, 5, 2]);
        assert_eq!(batch_sizes(5, 5), vec![5]);
        assert_eq!(batch_sizes(3, 5), vec![3]);
        assert!(batch_sizes(0, 5).is_empty());
    }

    #[test]
    fn per_type_strategy_batches_each_type() {
        let templates = templates(&[("default", "T=${type} N=${quantity}")]);
        let mut counts = BTreeMap::new();
        counts.insert("multiple_choice".to_string(), 12u32);
        counts.insert("true_false".to_string(), 5u32);
        counts.insert("short_answer".to_string(), 0u32);

        let types = vec!["multiple_choice".to_string(), "true_false".to_string()];
        let prompts = planner().plan(&PlanRequest {
            types: &types,
            type_counts: Some(&counts),
            quantity: None,
            custom_requirements: None,
            persona_intro: "intro",
            context: "ctx",
            templates: &templates,
        });

        // 12 -> [5,5,2], 5 -> [5], 0 -> nothing; types enumerate in sorted order
        assert_eq!(
            prompts,
            vec![
                "T=multiple_choice N=5",
                "T=multiple_choice N=5",
                "T=multiple_choice N=2",
                "T=true_false N=5",
            ]
        );
    }

    #[test]
    fn flat_strategy_uses_default_template_and_type_list() {
        let templates = templates(&[("default", "${persona_intro}|${type}|${quantity}|${context}")]);
        let types = vec!["multiple_choice".to_string(), "true_false".to_string()];

        let prompts = planner().plan(&PlanRequest {
            types: &types,
            type_counts: None,
            quantity: Some(7),
            custom_requirements: None,
            persona_intro: "P",
            context: "C",
            templates: &templates,
        });

        assert_eq!(
            prompts,
            vec![
                "P|multiple_choice, true_false|5|C",
                "P|multiple_choice, true_false|2|C",
            ]
        );
    }

    #[test]
    fn flat_strategy_defaults_to_ten() {
        let templates = templates(&[("default", "${quantity}")]);
        let types = vec!["short_answer".to_string()];

        let prompts = planner().plan(&PlanRequest {
            types: &types,
            type_counts: None,
            quantity: None,
            custom_requirements: None,
            persona_intro: "",
            context: "",
            templates: &templates,
        });

        assert_eq!(prompts, vec!["5", "5"]);
    }

    #[test]
    fn empty_type_counts_map_selects_flat_strategy() {
        let templates = templates(&[("default", "${quantity}")]);
        let counts = BTreeMap::new();
        let types = vec!["true_false".to_string()];

        let prompts = planner().plan(&PlanRequest {
            types: &types,
            type_counts: Some(&counts),
            quantity: Some(3),
            custom_requirements: None,
            persona_intro: "",
            context: "",
            templates: &templates,
        });

        assert_eq!(prompts, vec!["3"]);
    }

    #[test]
    fn missing_quantity_placeholder_appends_instruction() {
        let templates = templates(&[("default", "no placeholder here")]);
        let types = vec!["true_false".to_string()];

        let prompts = planner().plan(&PlanRequest {
            types: &types,
            type_counts: None,
            quantity: Some(4),
            custom_requirements: None,
            persona_intro: "",
            context: "",
            templates: &templates,
        });

        assert!(prompts[0].ends_with("Generate 4 questions for this batch."));
    }

    #[test]
    fn custom_requirements_appended_verbatim() {
        let templates = templates(&[("default", "${quantity}")]);
        let types = vec!["true_false".to_string()];

        let prompts = planner().plan(&PlanRequest {
            types: &types,
            type_counts: None,
            quantity: Some(2),
            custom_requirements: Some("Focus on chapter 3 only."),
            persona_intro: "",
            context: "",
            templates: &templates,
        });

        assert!(prompts[0].contains("Additional requirements: Focus on chapter 3 only."));
    }

    #[test]
    fn per_type_template_falls_back_to_default() {
        let templates = templates(&[
            ("default", "D ${quantity}"),
            ("multiple_choice", "MC ${quantity}"),
        ]);
        let mut counts = BTreeMap::new();
        counts.insert("multiple_choice".to_string(), 2u32);
        counts.insert("true_false".to_string(), 2u32);

        let types = vec!["multiple_choice".to_string(), "true_false".to_string()];
        let prompts = planner().plan(&PlanRequest {
            types: &types,
            type_counts: Some(&counts),
            quantity: None,
            custom_requirements: None,
            persona_intro: "",
            context: "",
            templates: &templates,
        });

        assert_eq!(prompts, vec!["MC 2", "D 2"]);
    }
}
