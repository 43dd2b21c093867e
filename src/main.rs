use pointer_fx::components::app::App;

fn main() {
    pointer_fx::util::init_logging();
    yew::Renderer::<App>::new().render();
}
