pub mod delay_loop;
