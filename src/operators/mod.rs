pub mod crossover;
pub mod permucomp;
pub mod permustrain;
pub mod permutomic;
pub mod strain;
pub mod stripple;
