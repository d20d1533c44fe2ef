use std::path::PathBuf;

use clap::{Parser, Subcommand};
use quizforge_core::types::TaskKind;

#[derive(Parser, Debug)]
#[command(name = "quizforge")]
#[command(about = "Generate validated study material with a language model", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file [default: ./quizforge.toml if present]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print a placeholder result instead of failing when the model is unreachable
    #[arg(long)]
    pub fallback: bool,

    /// Print pipeline counters in Prometheus text format to stderr when done
    #[arg(long)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Flashcard deck about a topic
    Flashcards {
        /// Topic to study
        #[arg(required = true, num_args = 1..)]
        topic: Vec<String>,
    },

    /// Multiple-choice quiz about a topic
    Quiz {
        /// Topic to study
        #[arg(required = true, num_args = 1..)]
        topic: Vec<String>,
    },

    /// Interview questions for a company or role
    Company {
        /// Company or role
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Step-by-step procedure as a numbered list
    Steps {
        /// What to explain
        #[arg(required = true, num_args = 1..)]
        task: Vec<String>,
    },

    /// Free-form question
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
}

impl Commands {
    /// Task kind and topic text for this command.
    pub fn task(&self) -> (TaskKind, String) {
        let (kind, words) = match self {
            Self::Flashcards { topic } => (TaskKind::Flashcards, topic),
            Self::Quiz { topic } => (TaskKind::Quiz, topic),
            Self::Company { name } => (TaskKind::CompanyQuestions, name),
            Self::Steps { task } => (TaskKind::StepList, task),
            Self::Ask { question } => (TaskKind::FreeText, question),
        };
        (kind, words.join(" "))
    }
}
