//! Aggregator: turns all per-file documents into one module overview.

use tracing::{error, info};

use crate::contract::{GenerationError, ItemDoc, OverviewDocument, TextGenerator};

/// Build the overview instruction around the concatenated per-file documentation.
pub fn overview_prompt(text: &str, module_kind: Option<&str>) -> String {
    let origin = match module_kind {
        Some(kind) => format!("the documentation of a {kind} module"),
        None => "the documentation of a software module".to_string(),
    };
    format!(
        "Take your time to read and understand the markdown that comes from {origin}. \
Generate documentation describing what the module does. Respond only with markdown:\n\n{text}"
    )
}

/// Concatenate `docs` in the order given, with no separator, and ask for an overview.
pub async fn aggregate<G>(
    generator: &G,
    docs: &[ItemDoc],
    module_kind: Option<&str>,
) -> Result<OverviewDocument, GenerationError>
where
    G: TextGenerator + ?Sized,
{
    let joined: String = docs.iter().map(|d| d.markdown.as_str()).collect();
    info!(documents = docs.len(), len = joined.len(), "[AGGREGATE] Requesting overview");
    let prompt = overview_prompt(&joined, module_kind);
    match generator.generate(&prompt).await {
        Ok(doc) => {
            info!(len = doc.markdown.len(), "[AGGREGATE] Overview received");
            Ok(OverviewDocument(doc.markdown))
        }
        Err(e) => {
            error!(error = %e, "[AGGREGATE][ERROR] Overview generation failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{GeneratedDoc, MockTextGenerator};

    fn doc(index: usize, markdown: &str) -> ItemDoc {
        ItemDoc {
            index,
            filename: format!("F{index}.php"),
            markdown: markdown.to_string(),
        }
    }

    #[tokio::test]
    async fn joins_documents_without_separator() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .withf(|prompt| prompt.ends_with("\n\n# A# B"))
            .times(1)
            .returning(|_| {
                Ok(GeneratedDoc {
                    markdown: "overview".to_string(),
                })
            });

        let overview = aggregate(&generator, &[doc(0, "# A"), doc(1, "# B")], None)
            .await
            .expect("aggregate should succeed");
        assert_eq!(overview.as_str(), "overview");
    }

    #[test]
    fn module_kind_narrows_the_instruction() {
        let prompt = overview_prompt("x", Some("Drupal 10"));
        assert!(prompt.contains("a Drupal 10 module"));
        let prompt = overview_prompt("x", None);
        assert!(prompt.contains("a software module"));
    }
}
