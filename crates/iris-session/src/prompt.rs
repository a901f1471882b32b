//! The fixed instruction frame placed around every user question.

/// Instruction template; `{query}` is replaced with the user's question.
pub const ANALYSIS_TEMPLATE: &str = "As an expert ophthalmologist, analyze this eye image for:
1. Cataracts (clouding, blurry vision)
2. Conjunctivitis (inflammation, redness)
3. Pterygium (tissue growth)

{query}

Note: This is for educational purposes only, not medical diagnosis.";

const QUERY_PLACEHOLDER: &str = "{query}";

/// Interpolate a user question into the analysis template.
pub fn build_prompt(query: &str) -> String {
    ANALYSIS_TEMPLATE.replacen(QUERY_PLACEHOLDER, query, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_verbatim() {
        let prompt = build_prompt("Is this cataracts?");
        assert_eq!(
            prompt,
            "As an expert ophthalmologist, analyze this eye image for:\n\
             1. Cataracts (clouding, blurry vision)\n\
             2. Conjunctivitis (inflammation, redness)\n\
             3. Pterygium (tissue growth)\n\
             \n\
             Is this cataracts?\n\
             \n\
             Note: This is for educational purposes only, not medical diagnosis."
        );
    }

    #[test]
    fn test_query_containing_placeholder_is_not_expanded_twice() {
        let prompt = build_prompt("what does {query} mean");
        assert!(prompt.contains("what does {query} mean"));
        assert!(!prompt.starts_with("what"));
    }
}
