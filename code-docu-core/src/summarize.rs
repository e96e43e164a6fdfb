//! Per-item summarizer: one structured generation call per source file.

use tracing::{debug, error, info};

use crate::contract::{GenerationError, ItemDoc, SourceItem, TextGenerator};

const ANALYSIS_INSTRUCTION: &str = "Take time to analyze and understand the given code. \
Generate documentation explaining what each function or method does. \
Do not describe parameters, arguments or return values. Respond only with markdown:";

/// Build the per-file instruction around the raw source text.
pub fn analysis_prompt(code: &str) -> String {
    format!("{ANALYSIS_INSTRUCTION}\n\n{code}")
}

/// Document one source item. `index` is the item's position in collector output
/// and is carried on the result as its correlation key.
pub async fn summarize_item<G>(
    generator: &G,
    index: usize,
    item: &SourceItem,
) -> Result<ItemDoc, GenerationError>
where
    G: TextGenerator + ?Sized,
{
    info!(index, file = %item.filename, "[SUMMARIZE] Requesting documentation for file");
    let prompt = analysis_prompt(&item.content);
    match generator.generate(&prompt).await {
        Ok(doc) => {
            debug!(index, file = %item.filename, len = doc.markdown.len(), "[SUMMARIZE] Documentation received");
            Ok(ItemDoc {
                index,
                filename: item.filename.clone(),
                markdown: doc.markdown,
            })
        }
        Err(e) => {
            error!(index, file = %item.filename, error = %e, "[SUMMARIZE][ERROR] Generation failed");
            Err(e)
        }
    }
}
