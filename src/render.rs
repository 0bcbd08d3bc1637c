//! Screen rendering.
//!
//! [`view`] turns a session into a [`Screen`] without side effects;
//! [`to_markdown`] and [`print`] take care of the terminal.

use crate::session::{Feedback, Notice, Session};

pub const TITLE: &str = "QuizGPT";

const WELCOME: &str = "Welcome to QuizGPT!

I will make a quiz from Wikipedia articles or files you upload to test your knowledge and help you study.

Get started by uploading a file or searching for a topic on Wikipedia.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub title: &'static str,
    /// Label/value pairs describing the current inputs
    pub sidebar: Vec<(String, String)>,
    pub notice: Option<Notice>,
    pub body: Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Welcome { missing_credential: bool },
    Quiz(QuizView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizView {
    pub questions: Vec<QuestionView>,
    pub result: Option<ResultView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub number: usize,
    pub text: String,
    pub options: Vec<String>,
    pub selected: Option<usize>,
    pub feedback: Option<Feedback>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultView {
    Perfect { total: usize },
    Partial { correct: usize, total: usize },
}

pub fn view(session: &Session) -> Screen {
    let mut sidebar = vec![
        ("Difficulty".to_string(), session.difficulty.to_string()),
        ("Source".to_string(), session.source_kind.to_string()),
    ];
    if let Some(label) = &session.source_label {
        sidebar.push(("Loaded".to_string(), label.clone()));
    }
    sidebar.push((
        "API key".to_string(),
        if session.context.has_credential() {
            "set".to_string()
        } else {
            "not set".to_string()
        },
    ));

    let body = match &session.quiz {
        Some(quiz) if !session.docs.is_empty() && session.context.has_credential() => {
            let questions = quiz
                .questions
                .iter()
                .enumerate()
                .map(|(i, q)| QuestionView {
                    number: i + 1,
                    text: q.question.clone(),
                    options: q.answers.iter().map(|a| a.answer.clone()).collect(),
                    selected: session.selection(i),
                    feedback: session.feedback(i),
                })
                .collect();

            let result = session.score().map(|score| {
                if score.is_perfect() {
                    ResultView::Perfect { total: score.total }
                } else {
                    ResultView::Partial {
                        correct: score.correct,
                        total: score.total,
                    }
                }
            });

            Body::Quiz(QuizView { questions, result })
        }
        _ => Body::Welcome {
            missing_credential: !session.context.has_credential(),
        },
    };

    Screen {
        title: TITLE,
        sidebar,
        notice: session.notice.clone(),
        body,
    }
}

/// Letter shown before an option
pub fn option_label(index: usize) -> char {
    (b'a' + (index % 26) as u8) as char
}

pub fn result_message(result: &ResultView) -> String {
    match result {
        ResultView::Perfect { total } => format!(
            "Congratulations! You got all answers correct ({} out of {}).",
            total, total
        ),
        ResultView::Partial { correct, total } => format!(
            "You got {} out of {} questions correct. Please try again!",
            correct, total
        ),
    }
}

pub fn to_markdown(screen: &Screen) -> String {
    let mut out = format!("# {}\n\n", screen.title);

    let sidebar: Vec<String> = screen
        .sidebar
        .iter()
        .map(|(label, value)| format!("*{}:* {}", label, value))
        .collect();
    out.push_str(&sidebar.join(" | "));
    out.push_str("\n\n");

    match &screen.notice {
        Some(Notice::Warning(message)) => out.push_str(&format!("> ⚠ {}\n\n", message)),
        Some(Notice::Error(message)) => out.push_str(&format!("> ✗ {}\n\n", message)),
        None => {}
    }

    match &screen.body {
        Body::Welcome { missing_credential } => {
            out.push_str(WELCOME);
            out.push_str("\n\n");
            if *missing_credential {
                out.push_str("> ⚠ Please enter your OpenAI API key\n");
            }
        }
        Body::Quiz(quiz) => {
            for q in &quiz.questions {
                out.push_str(&format!("**{}. {}**\n\n", q.number, q.text));
                for (i, option) in q.options.iter().enumerate() {
                    let mark = if q.selected == Some(i) { "(•)" } else { "( )" };
                    out.push_str(&format!("* {} {}) {}\n", mark, option_label(i), option));
                }
                match q.feedback {
                    Some(Feedback::Correct) => out.push_str("\n✓ Correct!\n"),
                    Some(Feedback::Wrong) => out.push_str("\n✗ Wrong!\n"),
                    None => {}
                }
                out.push('\n');
            }

            if let Some(result) = &quiz.result {
                out.push_str(&format!("---\n\n**{}**\n", result_message(result)));
            }
        }
    }

    out
}

/// Render a screen to the terminal using termimad
pub fn print(screen: &Screen) {
    let skin = termimad::MadSkin::default();
    skin.print_text(&to_markdown(screen));
}
