mod capture;
mod config;
mod session;
mod silent;
mod wav;
