//! Static question catalog for the guided interview.
//!
//! The bank is a fixed enumeration of categories, each holding an ordered
//! list of questions with option choices. It is immutable at runtime and
//! referenced by `Category` key, never copied into session state.

use serde::{Deserialize, Serialize};

/// Topical group the questionnaire is organized into, in fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Education,
    Skills,
    WorkStyle,
    Goals,
}

impl Category {
    /// All categories in interview order.
    pub const ALL: [Category; 4] = [
        Category::Education,
        Category::Skills,
        Category::WorkStyle,
        Category::Goals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Education => "education",
            Category::Skills => "skills",
            Category::WorkStyle => "work_style",
            Category::Goals => "goals",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "education" => Ok(Category::Education),
            "skills" => Ok(Category::Skills),
            "work_style" => Ok(Category::WorkStyle),
            "goals" => Ok(Category::Goals),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

/// Where the interview cursor points: a category still needing answers,
/// or past the end of the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum NextCategory {
    Ask(Category),
    Complete,
}

impl NextCategory {
    pub fn category(&self) -> Option<Category> {
        match self {
            NextCategory::Ask(c) => Some(*c),
            NextCategory::Complete => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, NextCategory::Complete)
    }
}

impl From<NextCategory> for String {
    fn from(value: NextCategory) -> Self {
        match value {
            NextCategory::Ask(c) => c.as_str().to_string(),
            NextCategory::Complete => "complete".to_string(),
        }
    }
}

impl TryFrom<String> for NextCategory {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "complete" {
            Ok(NextCategory::Complete)
        } else {
            value.parse().map(NextCategory::Ask)
        }
    }
}

impl std::fmt::Display for NextCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NextCategory::Ask(c) => c.fmt(f),
            NextCategory::Complete => f.write_str("complete"),
        }
    }
}

/// One catalog question with its option choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
}

impl Question {
    pub fn new(text: impl Into<String>, options: &[&str]) -> Self {
        Self {
            text: text.into(),
            options: options.iter().map(|o| (*o).to_string()).collect(),
        }
    }
}

/// One category's slice of the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub category: Category,
    /// Answers required before the interview moves past this category.
    pub threshold: u32,
    pub questions: Vec<Question>,
}

/// Versioned catalog of question categories and their ordered questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBank {
    pub version: u32,
    entries: Vec<CategoryEntry>,
}

impl QuestionBank {
    /// Builds a bank with the given per-category answer threshold applied
    /// uniformly to the built-in catalog.
    pub fn with_threshold(threshold: u32) -> Self {
        let mut bank = Self::default();
        for entry in &mut bank.entries {
            entry.threshold = threshold;
        }
        bank
    }

    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    pub fn entry(&self, category: Category) -> &CategoryEntry {
        // The built-in catalog always covers every Category variant.
        self.entries
            .iter()
            .find(|e| e.category == category)
            .expect("catalog covers all categories")
    }

    pub fn threshold(&self, category: Category) -> u32 {
        self.entry(category).threshold
    }

    pub fn total_threshold(&self) -> u32 {
        self.entries.iter().map(|e| e.threshold).sum()
    }

    pub fn questions(&self, category: Category) -> &[Question] {
        &self.entry(category).questions
    }

    /// Deterministic fallback used when the advisor is unreachable: the
    /// `asked`-th catalog question for the category, wrapping around.
    pub fn fallback_question(&self, category: Category, asked: u32) -> &Question {
        let questions = self.questions(category);
        &questions[(asked as usize) % questions.len()]
    }

    pub fn first_category(&self) -> Category {
        self.entries[0].category
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self {
            version: 1,
            entries: vec![
                CategoryEntry {
                    category: Category::Education,
                    threshold: 2,
                    questions: vec![
                        Question::new(
                            "What is your highest completed level of education?",
                            &[
                                "High school",
                                "Bachelor's degree",
                                "Master's degree",
                                "Doctorate",
                                "Self-taught",
                            ],
                        ),
                        Question::new(
                            "Which subjects did you enjoy studying the most?",
                            &[
                                "Science and math",
                                "Arts and humanities",
                                "Business and economics",
                                "Technology",
                                "Social sciences",
                            ],
                        ),
                        Question::new(
                            "Are you interested in pursuing further education or certifications?",
                            &["Yes, soon", "Maybe later", "No, I prefer hands-on learning"],
                        ),
                    ],
                },
                CategoryEntry {
                    category: Category::Skills,
                    threshold: 2,
                    questions: vec![
                        Question::new(
                            "Which of these skill areas are you strongest in?",
                            &[
                                "Analytical thinking",
                                "Communication",
                                "Creative problem solving",
                                "Technical/hands-on work",
                                "Leadership",
                            ],
                        ),
                        Question::new(
                            "How comfortable are you picking up new tools or technologies?",
                            &["Very comfortable", "Somewhat comfortable", "I prefer familiar tools"],
                        ),
                        Question::new(
                            "Which skill would you most like to develop next?",
                            &[
                                "Public speaking",
                                "Data analysis",
                                "Project management",
                                "Design",
                                "Programming",
                            ],
                        ),
                    ],
                },
                CategoryEntry {
                    category: Category::WorkStyle,
                    threshold: 2,
                    questions: vec![
                        Question::new(
                            "Do you prefer working independently or as part of a team?",
                            &["Independently", "In a team", "A mix of both"],
                        ),
                        Question::new(
                            "What kind of work environment suits you best?",
                            &[
                                "Structured and predictable",
                                "Fast-paced and varied",
                                "Remote and flexible",
                                "Collaborative office",
                            ],
                        ),
                        Question::new(
                            "How do you handle deadlines and pressure?",
                            &[
                                "I thrive under pressure",
                                "I plan ahead to avoid it",
                                "I prefer steady, low-pressure work",
                            ],
                        ),
                    ],
                },
                CategoryEntry {
                    category: Category::Goals,
                    threshold: 2,
                    questions: vec![
                        Question::new(
                            "Where do you see your career in five years?",
                            &[
                                "Leading a team",
                                "Deep technical expertise",
                                "Running my own business",
                                "Work-life balance first",
                                "Still exploring",
                            ],
                        ),
                        Question::new(
                            "What matters most to you in your next role?",
                            &[
                                "Compensation",
                                "Learning opportunities",
                                "Impact and purpose",
                                "Stability",
                                "Flexibility",
                            ],
                        ),
                        Question::new(
                            "Are you open to relocating or changing industries?",
                            &["Yes, both", "Industry change only", "Relocation only", "Neither"],
                        ),
                    ],
                },
            ],
        }
    }
}
