use std::{thread, time::Duration};
use theremin::{AudioContext, Capabilities, Config, ThereminApp};
use theremin_player::Player;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let player = Player::new()?;
    let ctx = AudioContext::new(player.sample_rate_hz()?, Capabilities::MODERN);
    let mut app = ThereminApp::new(ctx.clone(), &Config::default())?;
    app.set_running(true)?;
    let _handle = player.play(ctx.renderer(), Default::default())?;
    for i in 0..=200 {
        let t = i as f32 / 200.0;
        app.set_gesture(t, 0.3 + 0.4 * (t * 12.0).sin().abs());
        thread::sleep(Duration::from_millis(20));
    }
    app.set_running(false)?;
    thread::sleep(Duration::from_millis(100));
    Ok(())
}
