//! Prompt rendering per task and document type.
//!
//! Every prompt ends with the analyzed text followed by an `Extraction:`
//! cue, which is where structured decoding is told to stop.

use archivist_core::{DocumentType, ExtractionTask, PromptFidelity};

use crate::examples::TrainingExample;

/// Few-shot examples rendered into an enhanced prompt.
pub const MAX_PROMPT_EXAMPLES: usize = 3;

/// Renders prompts at a fixed fidelity.
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    fidelity: PromptFidelity,
}

impl PromptBuilder {
    pub fn new(fidelity: PromptFidelity) -> Self {
        Self { fidelity }
    }

    pub fn build(
        &self,
        task: ExtractionTask,
        doc_type: DocumentType,
        segments: &[String],
        examples: &[TrainingExample],
    ) -> String {
        let instruction = match self.fidelity {
            PromptFidelity::Minimal => minimal_instruction(task).to_string(),
            PromptFidelity::Enhanced => enhanced_instruction(task, doc_type, examples),
        };
        format!(
            "{}\n\nText to analyze:\n{}\n\nExtraction:",
            instruction,
            segments.join(" ")
        )
    }
}

fn minimal_instruction(task: ExtractionTask) -> &'static str {
    match task {
        ExtractionTask::Date => "Extract the date. Return YYYY-MM-DD or YYYY only.",
        ExtractionTask::Title => "Extract the main title or subject.",
        ExtractionTask::Description => "Write a brief summary.",
        ExtractionTask::VolumeIssue => "Extract volume and issue numbers.",
    }
}

fn enhanced_instruction(
    task: ExtractionTask,
    doc_type: DocumentType,
    examples: &[TrainingExample],
) -> String {
    let mut prompt = String::from(task_instruction(task));
    if let Some(guidance) = document_guidance(task, doc_type) {
        prompt.push(' ');
        prompt.push_str(guidance);
    }

    if !examples.is_empty() {
        prompt.push_str("\n\nExamples:");
        for example in examples.iter().take(MAX_PROMPT_EXAMPLES) {
            prompt.push_str(&format!(
                "\nText: {}\nExtraction: {}",
                example.text, example.result
            ));
        }
    }

    if task == ExtractionTask::Description {
        prompt.push_str(
            "\n\nFirst note who wrote the document and its main purpose. \
             Then give only the final summary after \"Extraction:\".",
        );
    }
    prompt
}

fn task_instruction(task: ExtractionTask) -> &'static str {
    match task {
        ExtractionTask::Title => {
            "You are cataloguing historical documents. Extract the title or subject of this \
             document. Return only the title, without quotes or commentary."
        }
        ExtractionTask::Date => {
            "You are cataloguing historical documents. Extract the date the document was \
             written or published. Return YYYY-MM-DD when the day and month are known, \
             otherwise YYYY. Return \"none\" if no date appears."
        }
        ExtractionTask::Description => {
            "You are cataloguing historical documents. Write a one or two sentence summary \
             of this document for an archive catalogue."
        }
        ExtractionTask::VolumeIssue => {
            "You are cataloguing historical documents. Extract the volume and issue numbers. \
             Return them as \"Volume N, Issue M\", or \"Issue M\" when no volume is given. \
             Return \"none\" if the document has no volume or issue."
        }
    }
}

fn document_guidance(task: ExtractionTask, doc_type: DocumentType) -> Option<&'static str> {
    use DocumentType::*;
    use ExtractionTask::*;

    let guidance = match (task, doc_type) {
        (Title, Letter) => {
            "This is a letter: prefer an explicit \"Re:\" or \"Subject:\" line, otherwise \
             name the letter's purpose in under ten words."
        }
        (Title, Newsletter) => {
            "This is a newsletter: use the masthead title printed at the top, without the \
             volume, issue or date."
        }
        (Title, Report) => "This is a report: use the title printed on the first page.",
        (Title, Article) => "This is an article: use its headline.",
        (Date, Letter) => "This is a letter: use the date it was written, usually near the top.",
        (Date, Newsletter) => {
            "This is a newsletter: use the publication date, not the dates of events it \
             announces."
        }
        (Date, Report) => "This is a report: use the date of issue, not the period it covers.",
        (Description, Letter) => "Mention who the letter addresses and what it asks or reports.",
        (Description, Newsletter) => "Mention the main stories or announcements.",
        (Description, Report) => "Mention the subject of the report and its main findings.",
        (VolumeIssue, Newsletter) => "Look in the masthead and the page headers.",
        _ => return None,
    };
    Some(guidance)
}
