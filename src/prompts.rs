pub const TRY_ON: &str = include_str!("../data/prompts/try_on.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Instruction text for a try-on request of the given garment category.
pub fn try_on_instruction(category: &str) -> String {
    render(TRY_ON, &[("category", category)]).trim().to_string()
}
