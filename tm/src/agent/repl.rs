//! Interactive chat REPL

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use super::{AgentResponse, ChatSession, TripAgent};
use crate::llm::{ContentBlock, MessageContent, Role};

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}

/// Interactive chat over one `ChatSession`
pub struct ChatRepl {
    agent: TripAgent,
    session: ChatSession,
}

impl ChatRepl {
    pub fn new(agent: TripAgent, session: ChatSession) -> Self {
        Self { agent, session }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self, initial_message: Option<String>) -> Result<()> {
        self.print_welcome();

        if let Some(message) = initial_message {
            println!("{} {}", ">".bright_green(), message);
            self.send(&message).await;
        }

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            match rl.readline(&format!("{} ", ">".bright_green())) {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.send(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Safe travels!");
        Ok(())
    }

    async fn send(&mut self, input: &str) {
        debug!(%input, "ChatRepl::send: called");
        let response = self.agent.process_message(&mut self.session, input).await;
        print_response(&response);
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "TripMind".bright_cyan().bold());
        if let Some(trip_id) = self.session.bound_trip() {
            println!("Chatting about trip #{}", trip_id);
        }
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");

        match cmd {
            "/help" | "/h" => {
                print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/clear" | "/c" => {
                self.session.clear();
                println!("{}", "Conversation cleared.".dimmed());
                SlashResult::Continue
            }
            "/history" => {
                self.print_history();
                SlashResult::Continue
            }
            "/trip" => {
                self.print_current_trip().await;
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    fn print_history(&self) {
        let history = self.session.history();
        if history.is_empty() {
            println!("{}", "No conversation history.".dimmed());
            return;
        }

        println!();
        println!("{}", "Conversation History:".bright_cyan());
        for (i, msg) in history.iter().enumerate() {
            let role = match msg.role {
                Role::User => "You".bright_green(),
                Role::Assistant => "TripMind".bright_blue(),
            };
            let preview = match &msg.content {
                MessageContent::Text(text) => {
                    let preview: String = text.chars().take(60).collect();
                    if text.chars().count() > 60 { format!("{}...", preview) } else { preview }
                }
                MessageContent::Blocks(blocks) => blocks
                    .iter()
                    .map(|b| match b {
                        ContentBlock::Text { .. } => "[text]".to_string(),
                        ContentBlock::ToolUse { name, .. } => format!("[{}]", name),
                        ContentBlock::ToolResult { is_error, .. } => {
                            if *is_error { "[tool error]".to_string() } else { "[tool result]".to_string() }
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
            };
            println!("  {}. {}: {}", i + 1, role, preview);
        }
        println!();
    }

    async fn print_current_trip(&self) {
        let Some(trip_id) = self.session.current_trip() else {
            println!("{}", "No trip in this conversation yet.".dimmed());
            return;
        };
        match self.agent.planner().get_trip(trip_id).await {
            Ok(trip) if trip.user_id == self.session.user_id() => println!("{}", trip.summary()),
            Ok(_) => println!("{} Trip {} not found", "!".red(), trip_id),
            Err(e) => println!("{} {}", "!".red(), e),
        }
    }
}

fn print_help() {
    println!();
    println!("{}", "Available Commands:".bright_cyan());
    println!("  {:14} Show this help", "/help".yellow());
    println!("  {:14} Exit the chat", "/quit".yellow());
    println!("  {:14} Clear conversation history", "/clear".yellow());
    println!("  {:14} Show conversation history", "/history".yellow());
    println!("  {:14} Show the trip being discussed", "/trip".yellow());
    println!();
    println!("{}", "Things to try:".bright_cyan());
    println!("  Plan a trip to Lisbon in May for 5 days with a $2000 budget");
    println!("  Make it 2 travelers");
    println!("  Generate the itinerary");
    println!("  Show my trips");
    println!();
}

/// Print an agent reply with its action tag
pub fn print_response(response: &AgentResponse) {
    println!();
    let reply = match response.action_taken.as_str() {
        "error" => response.reply.red().to_string(),
        "confirmation_required" | "clarification" => response.reply.yellow().to_string(),
        _ => response.reply.clone(),
    };
    println!("{}", reply);
    if response.action_taken != "conversation" {
        let tag = match &response.trip {
            Some(trip) => format!("[{} · trip #{}]", response.action_taken, trip.id),
            None => format!("[{}]", response.action_taken),
        };
        println!("{}", tag.dimmed());
    }
    println!();
}
