//! Interactive terminal client for a DeFacto backend.
//!
//! Uploads a case document, then exchanges turns with the backend's
//! courtroom agents (or its tutor) until you quit.
//!
//! # Usage
//!
//! ```bash
//! # Start a mock trial as the defense attorney
//! defacto-chat --pdf case.pdf
//!
//! # Prosecute instead, against a remote backend
//! defacto-chat --pdf case.pdf --role PA --base-url http://court.example:8000/
//!
//! # Discuss a document with the tutor
//! defacto-chat --flow analyze --pdf notes.pdf
//!
//! # Read defaults from a YAML file
//! defacto-chat --config defacto.yaml
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/init <pdf> [DA|PA]` - Start a session
//! - `/mode simulate|feedback` - Choose where turns are routed
//! - `/history` - Reprint the transcript
//! - `/save <file>` - Save the transcript
//! - `/reset` - Drop the session
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use defacto::chat::{
    ChatArgs, ChatCommand, ChatConfig, PlainTextRenderer, Renderer, help_text, parse_command,
};
use defacto::{
    ChatType, DeFacto, Document, Error, Role, SessionController, StderrLogger, TurnOutcome,
    render_messages,
};

/// Main entry point for the defacto-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("defacto-chat [OPTIONS]");
    let config = ChatConfig::from_args(args)?;

    let mut client = DeFacto::with_options(Some(config.base_url.clone()), Some(config.timeout))?;
    if config.verbose {
        client = client.with_logger(Arc::new(StderrLogger));
    }
    let mut controller =
        SessionController::with_endpoints(client, config.flow, config.endpoints.clone());
    let mut renderer = PlainTextRenderer::with_color(config.use_color);
    let mut rl = DefaultEditor::new()?;

    // Flag for interrupt handling while a request is outstanding
    let interrupted = Arc::new(AtomicBool::new(false));

    // Set up Ctrl+C handler
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!(
        "DeFacto (flow: {}, backend: {})",
        controller.flow(),
        controller.backend().base_url()
    );
    println!("Type /help for commands, /quit to exit\n");

    if let Some(pdf) = &config.pdf {
        initialize_session(&mut controller, &mut renderer, pdf, config.role, &interrupted).await;
    } else {
        renderer.print_info("Use /init <pdf> [DA|PA] to start a session.");
    }

    let mut mode = ChatType::default();
    // A draft whose send failed is offered again at the next prompt.
    let mut pending_draft = String::new();

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let prompt = if controller.is_active() {
            format!("You [{mode}]: ")
        } else {
            "> ".to_string()
        };
        let readline = if pending_draft.is_empty() {
            rl.readline(&prompt)
        } else {
            rl.readline_with_initial(&prompt, (&pending_draft, ""))
        };

        match readline {
            Ok(raw) => {
                let line = raw.trim();
                if line.is_empty() {
                    pending_draft.clear();
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    pending_draft.clear();
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Init { pdf, role } => {
                            if controller.is_active() {
                                renderer.print_error(
                                    "A session is already active. Use /reset to drop it first.",
                                );
                            } else {
                                let role = role.unwrap_or(config.role);
                                initialize_session(
                                    &mut controller,
                                    &mut renderer,
                                    Path::new(&pdf),
                                    role,
                                    &interrupted,
                                )
                                .await;
                            }
                        }
                        ChatCommand::Mode(chat_type) => {
                            if chat_type == ChatType::Feedback
                                && !controller.endpoints().supports_feedback()
                            {
                                renderer.print_error(&format!(
                                    "The {} flow has no feedback route.",
                                    controller.flow()
                                ));
                            } else {
                                mode = chat_type;
                                renderer.print_info(&format!("Mode set to {mode}."));
                            }
                        }
                        ChatCommand::ShowMode => {
                            renderer.print_info(&format!("Current mode: {mode}"));
                        }
                        ChatCommand::History => match controller.transcript() {
                            Some(transcript) => render_messages(transcript, &mut renderer),
                            None => renderer.print_info("No active session."),
                        },
                        ChatCommand::Save(path) => match controller.save_transcript_to(&path) {
                            Ok(_) => renderer.print_info(&format!("Transcript saved to {}", path)),
                            Err(err) => {
                                renderer.print_error(&format!("Failed to save transcript: {}", err))
                            }
                        },
                        ChatCommand::Reset => match controller.reset() {
                            Some(session) => renderer.print_info(&format!(
                                "Session {} dropped. Use /init <pdf> [DA|PA] to start another.",
                                session.session_id
                            )),
                            None => renderer.print_info("No active session."),
                        },
                        ChatCommand::Stats => {
                            print_stats(&controller, mode);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                if !controller.is_active() {
                    renderer.print_error("No active session. Use /init <pdf> [DA|PA] first.");
                    continue;
                }

                // Regular message - send as a turn, exactly as typed
                let mut draft = raw.clone();
                send_turn(
                    &mut controller,
                    &mut renderer,
                    &mut draft,
                    mode,
                    &interrupted,
                    config.transcript_path.as_deref(),
                )
                .await;
                pending_draft = draft;
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                pending_draft.clear();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

async fn initialize_session(
    controller: &mut SessionController<DeFacto>,
    renderer: &mut PlainTextRenderer,
    pdf: &Path,
    role: Role,
    interrupted: &AtomicBool,
) {
    let document = match Document::from_path(pdf) {
        Ok(document) => document,
        Err(err) => {
            renderer.print_error(&err.to_string());
            return;
        }
    };

    renderer.start_pending(&format!(
        "Starting session as {} with {}...",
        role.description(),
        document.file_name()
    ));
    let result = tokio::select! {
        result = controller.initialize(Some(&document), Some(role)) => Some(result),
        _ = wait_for_interrupt(interrupted) => None,
    };
    renderer.finish_pending();

    match result {
        Some(Ok(())) => {
            if let Some(transcript) = controller.transcript() {
                render_messages(transcript, renderer);
            }
        }
        Some(Err(err)) => renderer.print_error(&format!("Failed to initialize session: {err}")),
        None => renderer.print_info("[interrupted]"),
    }
}

async fn send_turn(
    controller: &mut SessionController<DeFacto>,
    renderer: &mut PlainTextRenderer,
    draft: &mut String,
    mode: ChatType,
    interrupted: &AtomicBool,
    transcript_path: Option<&Path>,
) {
    renderer.start_pending("Generating response...");
    let result = tokio::select! {
        result = controller.send(draft, mode) => Some(result),
        _ = wait_for_interrupt(interrupted) => None,
    };
    renderer.finish_pending();

    match result {
        Some(Ok(outcome @ TurnOutcome::Completed { .. })) => {
            // The user's own line is already on screen.
            let messages = controller.turn_messages(outcome);
            render_messages(messages.iter().skip(1), renderer);
            if let Some(path) = transcript_path
                && let Err(err) = controller.save_transcript_to(path)
            {
                renderer.print_error(&format!("Failed to auto-save transcript: {err}"));
            }
        }
        Some(Ok(TurnOutcome::Skipped)) => {}
        Some(Err(err)) => report_turn_error(renderer, &err),
        None => renderer.print_info("[interrupted]"),
    }
}

fn report_turn_error(renderer: &mut PlainTextRenderer, err: &Error) {
    renderer.print_error(&format!("An error occurred while sending the message: {err}"));
    if err.is_session_lost() {
        renderer.print_info("The backend no longer knows this session. Use /reset, then /init.");
    } else if err.is_retryable() {
        renderer.print_info("Press Enter on the restored message to try again.");
    }
}

async fn wait_for_interrupt(interrupted: &AtomicBool) {
    while !interrupted.load(Ordering::Relaxed) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

fn print_stats(controller: &SessionController<DeFacto>, mode: ChatType) {
    let stats = controller.stats();
    println!("    Session Statistics:");
    println!("      Flow: {}", stats.flow);
    println!("      Backend: {}", controller.backend().base_url());
    match stats.session_id {
        Some(ref id) => println!("      Session: {}", id),
        None => println!("      Session: (none)"),
    }
    match stats.role {
        Some(role) => println!("      Role: {} ({})", role.description(), role),
        None => println!("      Role: (none)"),
    }
    println!("      Mode: {}", mode);
    println!("      Messages: {}", stats.message_count);
    println!("      Turns: {} ({} feedback)", stats.turns, stats.feedback_turns);
    println!("      Failed requests: {}", stats.failed_requests);
}
