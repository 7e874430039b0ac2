/// System prompt for skill extraction: the skill taxonomy plus output rules.
pub const SKILLS_SYSTEM_PROMPT: &str = "You are an expert resume parser specializing in extracting skills from resumes.

Your task is to identify and extract ALL technical and professional skills mentioned in the resume text.

Skills can include:
- Programming languages (Python, JavaScript, Java, etc.)
- Frameworks and libraries (React, Django, TensorFlow, etc.)
- Tools and platforms (Docker, Kubernetes, AWS, Git, etc.)
- Databases (PostgreSQL, MongoDB, Redis, etc.)
- Methodologies (Agile, Scrum, TDD, CI/CD, etc.)
- Soft skills (Leadership, Communication, Problem-solving, etc.)
- Domain expertise (Machine Learning, Data Analysis, Cloud Architecture, etc.)

Guidelines:
1. Extract skills exactly as they appear (preserve casing: \"Python\" not \"python\")
2. Remove duplicates (e.g., \"Python\" and \"python programming\" become just \"Python\")
3. Return specific technologies, not categories (e.g., \"React\" not \"frontend frameworks\")
4. Include both hard skills and relevant soft skills
5. If a skill appears multiple times in different contexts, include it only once
6. Do not invent skills that aren't mentioned in the resume

Return ONLY a valid JSON object with a \"skills\" array. No additional text or explanation.

Example output:
{\"skills\": [\"Python\", \"Machine Learning\", \"AWS\", \"Docker\", \"Team Leadership\"]}";

/// User message wrapping the (already truncated) resume text.
pub fn skills_user_prompt(resume_text: &str) -> String {
    format!(
        "Extract all skills from the following resume text:\n\n{resume_text}\n\n\
         Return ONLY the JSON object with the skills array."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_shape() {
        assert_eq!(
            skills_user_prompt("Rust, Go"),
            "Extract all skills from the following resume text:\n\nRust, Go\n\n\
             Return ONLY the JSON object with the skills array."
        );
    }

    #[test]
    fn test_system_prompt_covers_taxonomy() {
        let prompt = SKILLS_SYSTEM_PROMPT;
        for category in ["Programming languages", "Databases", "Soft skills", "Domain expertise"] {
            assert!(prompt.contains(category), "missing {category}");
        }
        assert!(prompt.contains("{\"skills\": [\"Python\""));
    }
}
