mod capability;
mod config;
mod controller;
mod dispatch;
mod error;
mod ollama;
mod presenter;
mod readiness;
mod router;
mod tools;

use iced::{
    widget::{button, column, container, pick_list, row, scrollable, text, text_editor, Column, Space},
    widget::scrollable::RelativeOffset,
    Element, Length, Task, Theme, Font, Subscription,
    time,
    keyboard::{self, Key},
    event::{self, Event as IcedEvent},
    alignment,
    window,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::capability::CapabilitySlot;
use crate::controller::{Settlement, Submission, ToolController};
use crate::presenter::SystemClipboard;
use crate::router::{PacingTimer, ShellRouter, ViewId};
use crate::tools::ToolKind;

fn output_scroll_id() -> scrollable::Id {
    scrollable::Id::new("tool-output")
}

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> iced::Result {
    init_tracing();
    let config = config::Config::load();

    iced::application("AI Code Assistant", App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(window::Settings {
            size: iced::Size::new(config.window.width as f32, config.window.height as f32),
            min_size: Some(iced::Size::new(
                config.window.min_width as f32,
                config.window.min_height as f32,
            )),
            position: window::Position::Centered,
            ..Default::default()
        })
        .default_font(Font::MONOSPACE)
        .run_with(move || App::new(config))
}

#[derive(Debug, Clone)]
enum Message {
    Navigate(ViewId),
    Back,
    Reveal(u64),
    Connected,
    ReadinessChanged(bool),
    Tool(ToolMessage),
    Tick,
    Escape,
}

#[derive(Debug, Clone)]
enum ToolMessage {
    Edit(text_editor::Action),
    LanguageSelected(&'static str),
    Submit,
    Reset,
    LoadExample,
    Copy,
    Settled(Settlement),
}

struct App {
    router: ShellRouter,
    tool: Option<ToolView>,
    slot: Arc<CapabilitySlot>,
    readiness_poll: Duration,
    clipboard: SystemClipboard,
    loading_frame: usize,
}

/// A mounted tool. Dropping it stops its readiness poll and aborts its
/// request, if any.
struct ToolView {
    controller: ToolController,
    editor: text_editor::Content,
}

impl App {
    fn new(config: config::Config) -> (Self, Task<Message>) {
        let slot = CapabilitySlot::global();
        let client = ollama::OllamaClient::with_config(config.ollama.host, config.ollama.model);
        let connect_task = Task::perform(
            ollama::connect(client, slot.clone(), config.timing.connect_retry()),
            |_| Message::Connected,
        );

        let router = ShellRouter::new(config.timing.page_transition());
        let pacing_task = Task::perform(router.initial_timer().elapse(), Message::Reveal);

        let app = App {
            router,
            tool: None,
            slot,
            readiness_poll: config.timing.readiness_poll(),
            clipboard: SystemClipboard::default(),
            loading_frame: 0,
        };

        (app, Task::batch([connect_task, pacing_task]))
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Navigate(target) => self.go(target),
            Message::Back => {
                let timer = self.router.back();
                self.start_pacing(timer)
            }
            Message::Reveal(generation) => self.reveal(generation),
            Message::Connected => Task::none(),
            Message::ReadinessChanged(ready) => {
                tracing::debug!(ready, "tool readiness changed");
                Task::none()
            }
            Message::Tool(message) => match self.tool.as_mut() {
                Some(view) => view.update(message, &mut self.clipboard),
                None => Task::none(),
            },
            Message::Tick => {
                self.loading_frame = (self.loading_frame + 1) % 80;
                Task::none()
            }
            Message::Escape => match self.router.active() {
                ViewId::Home => iced::exit(),
                ViewId::Tool(_) => self.go(ViewId::Home),
            },
        }
    }

    fn go(&mut self, target: ViewId) -> Task<Message> {
        let timer = self.router.navigate(target);
        self.start_pacing(timer)
    }

    /// Unmounts the current tool and schedules the reveal of the next view.
    fn start_pacing(&mut self, timer: Option<PacingTimer>) -> Task<Message> {
        match timer {
            Some(timer) => {
                self.tool = None;
                Task::perform(timer.elapse(), Message::Reveal)
            }
            None => Task::none(),
        }
    }

    fn reveal(&mut self, generation: u64) -> Task<Message> {
        if !self.router.reveal(generation) {
            return Task::none();
        }

        let ViewId::Tool(kind) = self.router.active() else {
            return Task::none();
        };
        let (controller, poll) =
            ToolController::open(kind.spec(), self.slot.clone(), self.readiness_poll);
        let editor = text_editor::Content::with_text(controller.input());
        self.tool = Some(ToolView { controller, editor });

        Task::run(poll.into_stream(), Message::ReadinessChanged)
    }

    fn is_busy(&self) -> bool {
        self.router.is_pacing()
            || self
                .tool
                .as_ref()
                .is_some_and(|view| view.controller.is_pending())
    }

    fn subscription(&self) -> Subscription<Message> {
        let timer = if self.is_busy() {
            time::every(Duration::from_millis(80)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };

        let events = event::listen_with(|event, _status, _id| {
            if let IcedEvent::Keyboard(keyboard::Event::KeyPressed {
                key: Key::Named(keyboard::key::Named::Escape),
                ..
            }) = event
            {
                Some(Message::Escape)
            } else {
                None
            }
        });

        Subscription::batch([timer, events])
    }

    fn view(&self) -> Element<Message> {
        if self.router.is_pacing() {
            return self.loading_view();
        }

        match (self.router.active(), &self.tool) {
            (ViewId::Tool(_), Some(view)) => view.view(self.loading_frame),
            _ => self.home_view(),
        }
    }

    fn loading_view(&self) -> Element<Message> {
        let spinner_idx = self.loading_frame % SPINNER_FRAMES.len();

        container(
            column![
                text(SPINNER_FRAMES[spinner_idx]).size(32),
                text("Loading...").size(15)
            ]
            .spacing(10)
            .align_x(alignment::Horizontal::Center),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .align_x(alignment::Horizontal::Center)
        .align_y(alignment::Vertical::Center)
        .into()
    }

    fn home_view(&self) -> Element<Message> {
        let header = column![
            text("AI Code Assistant").size(36),
            text("Your all-in-one coding companion. Paste your code and let AI do the rest.").size(16),
        ]
        .spacing(8)
        .align_x(alignment::Horizontal::Center);

        let cards: Vec<Element<Message>> = ToolKind::ALL
            .iter()
            .map(|kind| {
                let spec = kind.spec();
                button(
                    column![
                        text(spec.title).size(22),
                        text(spec.description).size(15),
                        text(spec.explanation).size(13),
                    ]
                    .spacing(6),
                )
                .on_press(Message::Navigate(ViewId::Tool(*kind)))
                .padding(16)
                .width(Length::Fill)
                .into()
            })
            .collect();

        let content = column![
            header,
            Column::with_children(cards).spacing(12),
            text("Built with Ollama • No data stored").size(13),
        ]
        .spacing(24)
        .padding(24)
        .align_x(alignment::Horizontal::Center);

        scrollable(content).height(Length::Fill).into()
    }

    fn theme(&self) -> Theme {
        Theme::Dracula
    }
}

impl ToolView {
    fn update(&mut self, message: ToolMessage, clipboard: &mut SystemClipboard) -> Task<Message> {
        match message {
            ToolMessage::Edit(action) => {
                self.editor.perform(action);
                self.controller.on_input_changed(self.editor.text());
                Task::none()
            }
            ToolMessage::LanguageSelected(language) => {
                self.controller.select_language(language);
                Task::none()
            }
            ToolMessage::Submit => match self.controller.submit() {
                Submission::Dispatched(pending) => Task::perform(pending.run(), |settlement| {
                    Message::Tool(ToolMessage::Settled(settlement))
                }),
                Submission::Ignored | Submission::Settled => Task::none(),
            },
            ToolMessage::Reset => {
                self.controller.reset();
                self.editor = text_editor::Content::new();
                Task::none()
            }
            ToolMessage::LoadExample => {
                self.controller.load_example();
                self.editor = text_editor::Content::with_text(self.controller.input());
                Task::none()
            }
            ToolMessage::Copy => {
                self.controller.copy_result(clipboard);
                Task::none()
            }
            ToolMessage::Settled(settlement) => {
                if self.controller.settle(settlement) && self.controller.tool().follow_output {
                    scrollable::snap_to(output_scroll_id(), RelativeOffset::END)
                } else {
                    Task::none()
                }
            }
        }
    }

    fn view(&self, loading_frame: usize) -> Element<Message> {
        let spec = self.controller.tool();
        let display = presenter::present(&self.controller);
        let pending = self.controller.is_pending();
        let ready = self.controller.is_ready();

        let header = row![
            button(text("← Home")).on_press(Message::Back).padding(8),
            container(text(spec.title).size(28))
                .width(Length::Fill)
                .align_x(alignment::Horizontal::Center),
            Space::with_width(Length::Fixed(80.0)),
        ]
        .spacing(10)
        .align_y(alignment::Vertical::Center);

        let mut controls = row![].spacing(12).align_y(alignment::Vertical::Center);
        if !spec.languages.is_empty() {
            controls = controls.push(
                pick_list(spec.languages, self.controller.language(), |language| {
                    Message::Tool(ToolMessage::LanguageSelected(language))
                })
                .padding(10),
            );
        }

        let action_label = if pending {
            let spinner = SPINNER_FRAMES[loading_frame % SPINNER_FRAMES.len()];
            format!("{} {}", spinner, spec.busy_label)
        } else {
            format!("▶ {}", spec.action_label)
        };
        let can_submit = !pending && (ready || !spec.gated_on_readiness);
        controls = controls
            .push(
                button(text(action_label))
                    .on_press_maybe(can_submit.then_some(Message::Tool(ToolMessage::Submit)))
                    .padding(12),
            )
            .push(
                button(text("⟲ Reset"))
                    .on_press_maybe((!pending).then_some(Message::Tool(ToolMessage::Reset)))
                    .padding(12),
            )
            .push(
                button(text("Load example"))
                    .on_press_maybe((!pending).then_some(Message::Tool(ToolMessage::LoadExample)))
                    .padding(12),
            );
        if !ready {
            controls = controls.push(text("Waiting for the AI service...").size(14));
        }

        let status_line = match &display.status_line {
            Some(line) if *line != display.body => text(line.clone()).size(16),
            _ => text(""),
        };

        let editor = column![
            text(spec.input_heading).size(20),
            text_editor(&self.editor)
                .on_action(|action| Message::Tool(ToolMessage::Edit(action)))
                .font(Font::MONOSPACE)
                .padding(10)
                .height(Length::Fill),
        ]
        .spacing(10)
        .width(Length::FillPortion(1));

        let output_title = match self.controller.language() {
            Some(language) if spec.copyable => format!("{} ({})", spec.output_heading, language),
            _ => spec.output_heading.to_string(),
        };
        let mut output_header = row![text(output_title).size(20)]
            .spacing(10)
            .align_y(alignment::Vertical::Center);
        if spec.copyable {
            output_header = output_header.push(Space::with_width(Length::Fill)).push(
                button(text("[Copy]").size(14))
                    .on_press_maybe((!pending).then_some(Message::Tool(ToolMessage::Copy)))
                    .padding(8),
            );
        }

        let output = column![
            output_header,
            scrollable(
                container(text(display.body).size(15).font(Font::MONOSPACE))
                    .padding(15)
                    .width(Length::Fill)
            )
            .id(output_scroll_id())
            .height(Length::Fill),
        ]
        .spacing(10)
        .width(Length::FillPortion(1));

        column![
            header,
            controls,
            status_line,
            row![editor, output].spacing(20).height(Length::Fill),
        ]
        .spacing(16)
        .padding(16)
        .into()
    }
}
