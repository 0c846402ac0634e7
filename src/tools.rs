//! The five tools. Each one is a configuration of the same request lifecycle:
//! a prompt template, a seed snippet and the wording shown around it.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Converter,
    Compiler,
    TimeComplexity,
    SpaceComplexity,
    Explainer,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::Converter,
        ToolKind::Compiler,
        ToolKind::TimeComplexity,
        ToolKind::SpaceComplexity,
        ToolKind::Explainer,
    ];

    pub fn spec(self) -> &'static ToolSpec {
        match self {
            ToolKind::Converter => &CONVERTER,
            ToolKind::Compiler => &COMPILER,
            ToolKind::TimeComplexity => &TIME_COMPLEXITY,
            ToolKind::SpaceComplexity => &SPACE_COMPLEXITY,
            ToolKind::Explainer => &EXPLAINER,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().title)
    }
}

/// Builds the prompt from the user's code and the selected language, if the
/// tool has one.
pub type PromptTemplate = fn(code: &str, language: Option<&str>) -> String;

/// What to do when the AI answers with nothing usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReply {
    /// Show the fixed no-output marker.
    Marker,
    /// Treat it as a failed request with this message.
    Reject(&'static str),
}

pub struct ToolSpec {
    pub kind: ToolKind,
    pub title: &'static str,
    pub description: &'static str,
    pub explanation: &'static str,
    pub prompt: PromptTemplate,
    pub seed: &'static str,
    pub languages: &'static [&'static str],
    pub default_language: Option<&'static str>,
    pub input_heading: &'static str,
    pub output_heading: &'static str,
    pub action_label: &'static str,
    pub busy_label: &'static str,
    pub placeholder: &'static str,
    pub progress: &'static str,
    pub success_message: Option<&'static str>,
    pub empty_input_message: &'static str,
    pub not_ready_message: &'static str,
    pub empty_reply: EmptyReply,
    pub copyable: bool,
    /// Keep the action button disabled until the AI service is reachable.
    pub gated_on_readiness: bool,
    /// Scroll the output panel to the end when a reply lands.
    pub follow_output: bool,
}

impl ToolSpec {
    #[allow(dead_code)]
    pub fn render_prompt(&self, code: &str, language: Option<&str>) -> String {
        (self.prompt)(code, language)
    }

    pub fn accepts_language(&self, language: &str) -> bool {
        self.languages.contains(&language)
    }
}

impl fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSpec").field("kind", &self.kind).finish()
    }
}

pub const NO_OUTPUT_MARKER: &str = "✅ Code executed successfully (no output)";

const CONVERTER_LANGUAGES: &[&str] = &[
    "Python",
    "Java",
    "C",
    "C++",
    "JavaScript",
    "TypeScript",
    "Go",
    "Rust",
    "PHP",
    "C#",
    "Ruby",
];

const COMPILER_LANGUAGES: &[&str] = &["JavaScript", "Python", "Java", "C++", "PHP", "Ruby"];

fn convert_prompt(code: &str, language: Option<&str>) -> String {
    format!(
        "Convert this code to {}. Return ONLY the converted code, no explanations.\n\nInput Code:\n{}",
        language.unwrap_or("Python"),
        code
    )
}

fn compile_prompt(code: &str, language: Option<&str>) -> String {
    format!(
        "Act as a {} compiler. Run this code and show me ONLY the output.\nIf there are errors, show ONLY the error message.\n\nCode:\n{}",
        language.unwrap_or("JavaScript"),
        code
    )
}

fn time_complexity_prompt(code: &str, _language: Option<&str>) -> String {
    format!(
        "Analyze the time complexity of this code. Explain in simple terms:\n\
         1. What is the Big O notation?\n\
         2. Why is it that complexity?\n\
         3. Give a simple real-world example\n\
         4. Suggest improvements if possible\n\nCode:\n{}",
        code
    )
}

fn space_complexity_prompt(code: &str, _language: Option<&str>) -> String {
    format!(
        "Analyze the space complexity of this code. Explain in simple terms:\n\
         1. What is the Big O notation for memory usage?\n\
         2. Which variables or data structures use the memory?\n\
         3. Give a simple real-world example\n\
         4. Suggest ways to use less memory if possible\n\nCode:\n{}",
        code
    )
}

fn explain_prompt(code: &str, _language: Option<&str>) -> String {
    format!(
        "Explain this code in VERY SIMPLE terms that a 10-year-old could understand:\n\
         1. What does the code do overall?\n\
         2. Explain each line simply\n\
         3. Give a real-world example\n\
         4. Use emojis and simple words\n\nCode:\n{}",
        code
    )
}

static CONVERTER: ToolSpec = ToolSpec {
    kind: ToolKind::Converter,
    title: "🔁 Code Converter",
    description: "Convert code between different programming languages instantly",
    explanation: "Like Google Translate for code! Turn Python into Java, JavaScript into C++, etc.",
    prompt: convert_prompt,
    seed: "function helloWorld() {\n  console.log(\"Hello, world!\");\n  return \"Done!\";\n}",
    languages: CONVERTER_LANGUAGES,
    default_language: Some("Python"),
    input_heading: "Input Code",
    output_heading: "Output",
    action_label: "Convert Code",
    busy_label: "Converting...",
    placeholder: "// Converted code will appear here...",
    progress: "🔄 Converting your code...",
    success_message: Some("Successfully converted!"),
    empty_input_message: "Please enter some code to convert",
    not_ready_message: "AI is getting ready... Please wait a moment",
    empty_reply: EmptyReply::Reject("AI didn't return any code"),
    copyable: true,
    gated_on_readiness: true,
    follow_output: false,
};

static COMPILER: ToolSpec = ToolSpec {
    kind: ToolKind::Compiler,
    title: "⚡ Code Compiler",
    description: "Run and test your code in multiple languages",
    explanation: "Test your code without installing anything. See if it works correctly!",
    prompt: compile_prompt,
    seed: "function add(a, b) {\n  return a + b;\n}\n\nconsole.log(add(5, 3));",
    languages: COMPILER_LANGUAGES,
    default_language: Some("JavaScript"),
    input_heading: "Your Code",
    output_heading: "Output",
    action_label: "Run Code",
    busy_label: "Running...",
    placeholder: "Run your code to see output here...",
    progress: "🔄 Running your code...",
    success_message: None,
    empty_input_message: "Please enter some code to run",
    not_ready_message: "AI compiler not ready yet",
    empty_reply: EmptyReply::Marker,
    copyable: false,
    gated_on_readiness: false,
    follow_output: false,
};

static TIME_COMPLEXITY: ToolSpec = ToolSpec {
    kind: ToolKind::TimeComplexity,
    title: "⏱️ Time Complexity",
    description: "Analyze how fast your code runs with big inputs",
    explanation: "Find out if your code will be fast or slow when processing lots of data",
    prompt: time_complexity_prompt,
    seed: "function findMax(arr) {\n  let max = arr[0];\n  for (let i = 1; i < arr.length; i++) {\n    if (arr[i] > max) max = arr[i];\n  }\n  return max;\n}",
    languages: &[],
    default_language: None,
    input_heading: "Your Code",
    output_heading: "Analysis",
    action_label: "Analyze Complexity",
    busy_label: "Analyzing...",
    placeholder: "Click analyze to see time complexity...",
    progress: "🔄 Analyzing time complexity...",
    success_message: None,
    empty_input_message: "Please enter some code to analyze",
    not_ready_message: "AI module not loaded yet. Try again in a moment.",
    empty_reply: EmptyReply::Marker,
    copyable: false,
    gated_on_readiness: true,
    follow_output: true,
};

static SPACE_COMPLEXITY: ToolSpec = ToolSpec {
    kind: ToolKind::SpaceComplexity,
    title: "💾 Space Complexity",
    description: "Check how much memory your code uses",
    explanation: "See how much computer memory your code needs to run",
    prompt: space_complexity_prompt,
    seed: "function duplicate(arr) {\n  const copy = [];\n  for (const item of arr) {\n    copy.push(item, item);\n  }\n  return copy;\n}",
    languages: &[],
    default_language: None,
    input_heading: "Your Code",
    output_heading: "Analysis",
    action_label: "Analyze Complexity",
    busy_label: "Analyzing...",
    placeholder: "Click analyze to see space complexity...",
    progress: "🔄 Analyzing space complexity...",
    success_message: None,
    empty_input_message: "Please enter some code to analyze",
    not_ready_message: "AI module not loaded yet. Try again in a moment.",
    empty_reply: EmptyReply::Marker,
    copyable: false,
    gated_on_readiness: true,
    follow_output: true,
};

static EXPLAINER: ToolSpec = ToolSpec {
    kind: ToolKind::Explainer,
    title: "📖 Code Explainer",
    description: "Understand any code line by line in simple words",
    explanation: "Don't understand code? We'll explain it like you're 10 years old!",
    prompt: explain_prompt,
    seed: "function calculateTotal(items) {\n  let total = 0;\n  for (let item of items) {\n    total += item.price * item.quantity;\n  }\n  return total * 1.08; // Add 8% tax\n}",
    languages: &[],
    default_language: None,
    input_heading: "Your Code",
    output_heading: "Explanation",
    action_label: "Explain This Code",
    busy_label: "Explaining...",
    placeholder: "Click explain to understand your code...",
    progress: "🔄 Analyzing your code...",
    success_message: None,
    empty_input_message: "Please enter some code to explain",
    not_ready_message: "AI module not loaded yet. Try again in a moment.",
    empty_reply: EmptyReply::Marker,
    copyable: false,
    gated_on_readiness: true,
    follow_output: true,
};
