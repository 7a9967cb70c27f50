#![no_main]

use libfuzzer_sys::fuzz_target;
use deckhand::frontend::FrontendEvent;
use deckhand::frontend::headless::{ScriptLine, parse_line};
use deckhand::input::{self, NavigationCommand};
use deckhand::nav::{NavigationController, NavigationLock, StepBus};

fuzz_target!(|data: &[u8]| {
    let Some((&len, script)) = data.split_first() else {
        return;
    };
    let Ok(script) = std::str::from_utf8(script) else {
        return;
    };

    let len = usize::from(len % 16) + 1;
    let mut controller = NavigationController::new(len, NavigationLock::new(), StepBus::new());

    for line in script.lines() {
        let Some(Ok(ScriptLine::Event(FrontendEvent::Input(raw)))) = parse_line(line) else {
            continue;
        };
        match input::translate(&raw) {
            Some(NavigationCommand::Advance) => {
                controller.advance();
            }
            Some(NavigationCommand::Retreat) => {
                controller.retreat();
            }
            None => {}
        }
        assert!(controller.position() < len);
    }
});
