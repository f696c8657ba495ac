//! Feature encoders.

use crate::config::EncoderConfig;
use crate::{Result, TrexError};
use tch::nn;

/// Which encoder an observation shape gets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncoderKind {
    /// Flattened frames through linear layers
    Mlp,
    /// Convolutions over `[C, H, W]` frames, then linear layers
    Cnn,
}

impl EncoderKind {
    pub fn for_shape(obs_shape: &[usize], config: &EncoderConfig) -> Self {
        if obs_shape.len() == 3 && config.kernel_size.is_some() {
            EncoderKind::Cnn
        } else {
            EncoderKind::Mlp
        }
    }
}

/// Build the encoder for frames of `obs_shape`.
///
/// Returns the network and the size of its output features.
pub fn build_encoder(
    path: &nn::Path,
    obs_shape: &[usize],
    config: &EncoderConfig,
) -> Result<(nn::Sequential, i64)> {
    match EncoderKind::for_shape(obs_shape, config) {
        EncoderKind::Mlp => {
            let in_size = obs_shape.iter().product::<usize>() as i64;
            let seq = nn::seq().add_fn(|x| x.flatten(1, -1));
            Ok(add_linear_layers(path, seq, in_size, &config.hidden_size_list, 0))
        }
        EncoderKind::Cnn => build_cnn(path, obs_shape, config),
    }
}

fn add_linear_layers(
    path: &nn::Path,
    mut seq: nn::Sequential,
    mut in_size: i64,
    sizes: &[i64],
    first_index: usize,
) -> (nn::Sequential, i64) {
    for (i, &size) in sizes.iter().enumerate() {
        let layer = nn::linear(
            path / format!("fc_{}", first_index + i),
            in_size,
            size,
            Default::default(),
        );
        seq = seq.add(layer).add_fn(|x| x.relu());
        in_size = size;
    }
    (seq, in_size)
}

fn build_cnn(
    path: &nn::Path,
    obs_shape: &[usize],
    config: &EncoderConfig,
) -> Result<(nn::Sequential, i64)> {
    let kernels = config.kernel_size.as_deref().unwrap_or(&[]);
    let strides = config.stride.as_deref().unwrap_or(&[]);
    if kernels.len() != strides.len() || kernels.len() >= config.hidden_size_list.len() {
        return Err(TrexError::InvalidConfig(
            "conv encoder needs matching kernel/stride lists and a trailing linear size".into(),
        ));
    }
    let (channels, linear_sizes) = config.hidden_size_list.split_at(kernels.len());

    let calc_conv = |size: i64, kernel: i64, stride: i64| (size - kernel) / stride + 1;
    let mut in_channels = obs_shape[0] as i64;
    let mut height = obs_shape[1] as i64;
    let mut width = obs_shape[2] as i64;

    let mut seq = nn::seq();
    for (i, ((&out_channels, &kernel), &stride)) in
        channels.iter().zip(kernels).zip(strides).enumerate()
    {
        let conv = nn::conv2d(
            path / format!("conv_{}", i),
            in_channels,
            out_channels,
            kernel,
            nn::ConvConfig {
                stride,
                ..Default::default()
            },
        );
        seq = seq.add(conv).add_fn(|x| x.leaky_relu());

        height = calc_conv(height, kernel, stride);
        width = calc_conv(width, kernel, stride);
        if height <= 0 || width <= 0 {
            return Err(TrexError::InvalidConfig(format!(
                "conv layer {} reduces a {:?} frame to nothing",
                i, obs_shape
            )));
        }
        in_channels = out_channels;
    }

    let features_dim = in_channels * height * width;
    let seq = seq.add_fn(|x| x.flatten(1, -1));
    Ok(add_linear_layers(path, seq, features_dim, linear_sizes, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_kind() {
        let mlp = EncoderConfig::default();
        assert_eq!(EncoderKind::for_shape(&[11], &mlp), EncoderKind::Mlp);
        assert_eq!(EncoderKind::for_shape(&[4, 84, 84], &mlp), EncoderKind::Mlp);

        let cnn = EncoderConfig {
            hidden_size_list: vec![16, 16, 64],
            kernel_size: Some(vec![7, 5]),
            stride: Some(vec![3, 2]),
        };
        assert_eq!(EncoderKind::for_shape(&[4, 84, 84], &cnn), EncoderKind::Cnn);
    }
}
