//! Moves a marker around a small grid with `w`/`a`/`s`/`d` typed on stdin.
//! Key presses arrive as window events; the component listens for them
//! through an effect and re-renders on a short debounce.

use std::io::BufRead;

use hookcls::host::Instant;
use hookcls::prelude::*;

const SIZE: i32 = 5;

render_affecting! {
    pub struct KeypadFields {
        x: i32 = SIZE / 2,
        y: i32 = SIZE / 2,
    }
    state {
        moves: u32 = 0,
    }
}

#[derive(Props, Clone, PartialEq)]
pub struct KeypadProps {
    pub window: EventTarget,
    #[prop(default = '@')]
    pub marker: char,
}

#[derive(Default)]
struct Keypad {
    ignored: u32,
}

impl Keypad {
    fn step(key: &str) -> Option<(i32, i32)> {
        match key {
            "w" => Some((0, -1)),
            "s" => Some((0, 1)),
            "a" => Some((-1, 0)),
            "d" => Some((1, 0)),
            _ => None,
        }
    }
}

impl Component for Keypad {
    type Props = KeypadProps;
    type Fields = KeypadFields;

    const UPDATE_POLICY: UpdatePolicy = UpdatePolicy::debounced();

    fn render(&mut self, cx: &RenderCx<'_, Self>, props: &KeypadProps) -> Option<Node> {
        let this = cx.instance();
        use_listener(&props.window, "keypress", move |e: &Event| {
            let Some((dx, dy)) = Keypad::step(&e.data) else {
                this.with_state_mut(|k| k.ignored += 1);
                return;
            };
            let moved_x = this.update(KeypadFields::x, |x| *x = (*x + dx).clamp(0, SIZE - 1));
            let moved_y = this.update(KeypadFields::y, |y| *y = (*y + dy).clamp(0, SIZE - 1));
            if moved_x || moved_y {
                this.dispatch(KeypadFields::moves, |m| m + 1);
            }
        });

        let (x, y) = (cx.get(KeypadFields::x), cx.get(KeypadFields::y));
        let rows = (0..SIZE).map(|row| {
            let line: String = (0..SIZE)
                .map(|col| if (col, row) == (x, y) { props.marker } else { '.' })
                .collect();
            Node::element("pre").child(line)
        });
        Some(
            Node::element("div")
                .with_children(rows)
                .child(format!(
                    "moves: {}, ignored keys: {}",
                    cx.state(KeypadFields::moves),
                    self.ignored
                )),
        )
    }
}

/// Flushes until the debounce timer has fired and nothing is pending.
fn settle(host: &mut Host) -> anyhow::Result<()> {
    host.flush()?;
    while let Some(deadline) = host.next_deadline() {
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        host.flush()?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut host = Host::new();
    let window = host.window();
    host.render(create_component::<Keypad>().element(KeypadPropsInput {
        window: window.clone(),
        marker: None,
    }))?;
    println!("{}", host.output());

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        for key in line.trim().chars() {
            window.emit(&Event::new("keypress").with_data(key.to_string()));
        }
        settle(&mut host)?;
        println!("{}", host.output());
    }

    host.unmount();
    log::info!("listeners left after unmount: {}", window.listener_count());
    Ok(())
}
