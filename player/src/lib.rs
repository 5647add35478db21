use cpal::{
    BufferSize, Device, OutputCallbackInfo, StreamConfig, SupportedBufferSize,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use theremin_core::Renderer;

#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// default: 0.01
    pub target_latency_s: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_latency_s: 0.01,
        }
    }
}

pub struct Player {
    device: Device,
}

/// Keeps the output stream alive. Audio stops when this is dropped.
pub struct PlayerHandle {
    stream: cpal::Stream,
}

impl PlayerHandle {
    pub fn pause(&self) -> anyhow::Result<()> {
        self.stream.pause()?;
        Ok(())
    }

    pub fn resume(&self) -> anyhow::Result<()> {
        self.stream.play()?;
        Ok(())
    }
}

impl Player {
    pub fn new() -> anyhow::Result<Self> {
        let host = cpal::default_host();
        log::info!("cpal host: {}", host.id().name());
        let device = host
            .default_output_device()
            .ok_or(anyhow::anyhow!("no output device"))?;
        if let Ok(name) = device.name() {
            log::info!("cpal device: {}", name);
        } else {
            log::info!("cpal device: (no name)");
        }
        Ok(Self { device })
    }

    /// The sample rate that `play` will run at. Create the audio context with this rate.
    pub fn sample_rate_hz(&self) -> anyhow::Result<f32> {
        Ok(self.device.default_output_config()?.sample_rate().0 as f32)
    }

    fn choose_config(&self, config: Config) -> anyhow::Result<StreamConfig> {
        let default_config = self.device.default_output_config()?;
        let sample_rate = default_config.sample_rate();
        let channels = default_config.channels().max(1);
        let ideal_buffer_size =
            (sample_rate.0 as f32 * config.target_latency_s) as u32 * channels as u32;
        // Round down to a multiple of 4. It's not clear why this is necessary but alsa complains
        // if the buffer size is not evenly divisible by 4.
        let ideal_buffer_size = ideal_buffer_size & (!3);
        let buffer_size = match default_config.buffer_size() {
            SupportedBufferSize::Range { min, max } => {
                BufferSize::Fixed(ideal_buffer_size.clamp(*min, *max))
            }
            SupportedBufferSize::Unknown => BufferSize::Default,
        };
        Ok(StreamConfig {
            channels,
            sample_rate,
            buffer_size,
        })
    }

    /// Start rendering on the audio thread. The same mono signal is written to every channel.
    pub fn play(&self, mut renderer: Renderer, config: Config) -> anyhow::Result<PlayerHandle> {
        let config = self.choose_config(config)?;
        log::info!("sample rate: {}", config.sample_rate.0);
        log::info!("num channels: {}", config.channels);
        log::info!("buffer size: {:?}", config.buffer_size);
        if config.sample_rate.0 as f32 != renderer.sample_rate_hz() {
            log::warn!(
                "audio context runs at {} Hz but the device runs at {} Hz",
                renderer.sample_rate_hz(),
                config.sample_rate.0
            );
        }
        let channels = config.channels as usize;
        let mut buf = Vec::new();
        let stream = self.device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &OutputCallbackInfo| {
                renderer.render_into(data.len() / channels, &mut buf);
                for (output, &input) in data.chunks_mut(channels).zip(buf.iter()) {
                    for element in output {
                        *element = input;
                    }
                }
            },
            |err| log::error!("stream error: {}", err),
            None,
        )?;
        stream.play()?;
        Ok(PlayerHandle { stream })
    }
}
