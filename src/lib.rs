//! # Animatronic Eyes Library
//!
//! Control core for a servo-driven animatronic eye mechanism steered with a
//! Wii Nunchuck.
//!
//! This library provides the safety clamping, smoothing and rate limiting of
//! servo pulses, the idle look/blink animation, and the control tick that
//! wires them to the servo shield and joystick.

pub mod config;
pub mod error;
pub mod limits;
pub mod controller;
pub mod motion;
pub mod animation;
pub mod hardware;
pub mod eyes;
